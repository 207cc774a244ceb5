use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::models::{Grade, GradeRecord, OTHER_TERM, UNKNOWN};

// Ten characters: two digits, two letters, two alphanumerics, four digits
// (e.g. 22HJ1A4311).
static ROLL_NO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}[A-Z]{2}[0-9A-Z]{2}\d{4}\b").unwrap());

static NAME_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Name\s*[:\-.]?\s*").unwrap());

/// Curriculum revision years that may prefix a subject code (R20, R23, ...).
pub const REVISION_YEARS: [&str; 5] = ["13", "16", "19", "20", "23"];

pub const MIN_RECORD_TOKENS: usize = 4;

/// How many trailing tokens are searched for the grade.
pub const GRADE_WINDOW: usize = 3;

/// Credits read as 15 are a lost decimal point in the memo layout.
pub const DECIMAL_ARTIFACT_CREDITS: f64 = 15.0;
pub const DECIMAL_ARTIFACT_FIX: f64 = 1.5;

/// Credit value assumed for an `F` row whose credit column went missing.
pub const FAILED_DEFAULT_CREDITS: f64 = 3.0;

/// Credit corrections for known extraction artifacts of the memo format.
///
/// These were tuned against one family of grade memos. Recheck them before
/// pointing the extractor at a new layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreditPolicy {
    pub decimal_artifact: f64,
    pub decimal_artifact_fix: f64,
    pub failed_default_credits: f64,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            decimal_artifact: DECIMAL_ARTIFACT_CREDITS,
            decimal_artifact_fix: DECIMAL_ARTIFACT_FIX,
            failed_default_credits: FAILED_DEFAULT_CREDITS,
        }
    }
}

impl CreditPolicy {
    pub fn normalize(&self, grade: Grade, credits: f64) -> f64 {
        let mut credits = credits;
        if credits == self.decimal_artifact {
            credits = self.decimal_artifact_fix;
        }
        if grade == Grade::F && credits == 0.0 {
            credits = self.failed_default_credits;
        }
        credits
    }
}

/// Raw fields of a recognized result line, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub code: String,
    pub subject: String,
    pub grade: Grade,
    pub credits: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Recognized(ParsedLine),
    Unrecognized,
}

/// Turns one normalized line into a result row, if it holds one.
///
/// Implement this to support a memo family with a different column layout;
/// identity recovery, credit policy and term decoding stay in [`Extractor`].
pub trait LineParser {
    fn parse_line(&self, line: &str) -> LineOutcome;
}

/// Positional heuristic: `<code> <subject tokens...> <credits/grade window>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoLineParser;

impl LineParser for MemoLineParser {
    fn parse_line(&self, line: &str) -> LineOutcome {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < MIN_RECORD_TOKENS || !is_subject_code(tokens[0]) {
            return LineOutcome::Unrecognized;
        }

        let last = tokens.len() - 1;
        for offset in 0..GRADE_WINDOW {
            let grade_idx = last - offset;
            let Some(grade) = Grade::from_symbol(tokens[grade_idx]) else {
                continue;
            };

            let (credits, subject_end) = match credits_near(&tokens, grade_idx) {
                Some((credits, idx)) if idx < grade_idx => (credits, idx),
                Some((credits, _)) => (credits, grade_idx),
                None => (0.0, grade_idx),
            };

            return LineOutcome::Recognized(ParsedLine {
                code: tokens[0].to_string(),
                subject: tokens[1..subject_end].join(" "),
                grade,
                credits,
            });
        }

        LineOutcome::Unrecognized
    }
}

fn is_subject_code(token: &str) -> bool {
    token.chars().count() > 3
        && token
            .chars()
            .next()
            .is_some_and(|c| c == 'R' || c.is_ascii_digit())
}

/// Credits sit right before the grade, or failing that right after it.
fn credits_near(tokens: &[&str], grade_idx: usize) -> Option<(f64, usize)> {
    let before = grade_idx.checked_sub(1).filter(|idx| *idx > 0);
    let after = Some(grade_idx + 1).filter(|idx| *idx < tokens.len());

    [before, after].into_iter().flatten().find_map(|idx| {
        let token = tokens[idx];
        if !is_numeric_token(token) {
            return None;
        }
        token.parse::<f64>().ok().map(|credits| (credits, idx))
    })
}

fn is_numeric_token(token: &str) -> bool {
    let digits = token.replacen('.', "", 1);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `R201101` -> `1-1`, `201101` -> `1-1`, anything without a digit pair -> `Others`.
pub fn decode_term(code: &str) -> String {
    let upper = code.to_ascii_uppercase();
    let mut chars = strip_revision(&upper).chars();
    match (chars.next(), chars.next()) {
        (Some(year), Some(half)) if year.is_ascii_digit() && half.is_ascii_digit() => {
            format!("{year}-{half}")
        }
        _ => OTHER_TERM.to_string(),
    }
}

fn strip_revision(code: &str) -> &str {
    if let Some(rest) = code.strip_prefix('R') {
        return REVISION_YEARS
            .iter()
            .find_map(|year| rest.strip_prefix(year))
            .unwrap_or(code);
    }

    // Bare numeric codes carry the revision year without the R.
    if code.len() >= 6 && code.bytes().all(|b| b.is_ascii_digit()) {
        return REVISION_YEARS
            .iter()
            .find_map(|year| code.strip_prefix(year))
            .unwrap_or(code);
    }

    code
}

pub fn normalize_line(raw: &str) -> String {
    raw.replace(['"', ','], "").trim().to_string()
}

fn recover_name(line: &str) -> Option<String> {
    if !line.contains("Name") || !(line.contains(':') || line.contains(' ')) {
        return None;
    }

    let candidate = NAME_SPLIT_RE.split(line).nth(1)?.trim();
    if candidate.chars().count() > 3 && !candidate.starts_with("Subject") {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Identity fields seen so far in one document. Each goes from unresolved
/// to resolved once and then stays fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseState {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
}

impl ParseState {
    pub fn observe(&mut self, line: &str) {
        if self.student_id.is_none() {
            if let Some(found) = ROLL_NO_RE.find(line) {
                debug!(roll_no = found.as_str(), "roll number found");
                self.student_id = Some(found.as_str().to_string());
            }
        }

        if self.student_name.is_none() {
            if let Some(name) = recover_name(line) {
                debug!(name = %name, "student name found");
                self.student_name = Some(name);
            }
        }
    }

    fn student_id(&self) -> &str {
        self.student_id.as_deref().unwrap_or(UNKNOWN)
    }

    fn student_name(&self) -> &str {
        self.student_name.as_deref().unwrap_or(UNKNOWN)
    }

    /// Stamps the resolved identity on every record, including rows emitted
    /// before the identity showed up.
    pub fn backfill(&self, records: &mut [GradeRecord]) {
        if let Some(id) = &self.student_id {
            for record in records.iter_mut() {
                record.student_id.clone_from(id);
            }
        }
        if let Some(name) = &self.student_name {
            for record in records.iter_mut() {
                record.student_name.clone_from(name);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extractor<P = MemoLineParser> {
    parser: P,
    policy: CreditPolicy,
}

impl<P: LineParser> Extractor<P> {
    pub fn new(parser: P, policy: CreditPolicy) -> Self {
        Self { parser, policy }
    }

    /// Parses one document given as page texts. Returns `None` when no line
    /// yields a record.
    pub fn extract<S: AsRef<str>>(&self, pages: &[S]) -> Option<Vec<GradeRecord>> {
        let mut state = ParseState::default();
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (page_idx, page) in pages.iter().enumerate() {
            for raw in page.as_ref().lines() {
                let line = normalize_line(raw);
                if line.is_empty() {
                    continue;
                }
                state.observe(&line);

                match self.parser.parse_line(&line) {
                    LineOutcome::Recognized(parsed) => {
                        records.push(self.build_record(parsed, &state));
                    }
                    LineOutcome::Unrecognized => {
                        trace!(page = page_idx + 1, line = %line, "line skipped");
                        skipped += 1;
                    }
                }
            }
        }

        if records.is_empty() {
            debug!(pages = pages.len(), skipped, "no result rows recognized");
            return None;
        }

        state.backfill(&mut records);
        debug!(
            pages = pages.len(),
            records = records.len(),
            skipped,
            roll_no = state.student_id(),
            "memo parsed"
        );
        Some(records)
    }

    fn build_record(&self, parsed: ParsedLine, state: &ParseState) -> GradeRecord {
        GradeRecord {
            student_id: state.student_id().to_string(),
            student_name: state.student_name().to_string(),
            term: decode_term(&parsed.code),
            subject: parsed.subject,
            grade: parsed.grade,
            credits: self.policy.normalize(parsed.grade, parsed.credits),
            points: parsed.grade.points(),
        }
    }
}

pub fn extract<S: AsRef<str>>(pages: &[S]) -> Option<Vec<GradeRecord>> {
    Extractor::<MemoLineParser>::default().extract(pages)
}
