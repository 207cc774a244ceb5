use std::collections::{BTreeMap, HashSet};

use crate::models::{GradeRecord, StudentTermSummary, TermSummary, TranscriptSummary};

/// Backlogs, failed subjects and credit-weighted GPA for one group of records.
pub fn summarize(records: &[GradeRecord]) -> StudentTermSummary {
    let failed_subjects: Vec<String> = records
        .iter()
        .filter(|record| record.grade.is_failure())
        .map(|record| record.subject.clone())
        .collect();

    StudentTermSummary {
        backlog_count: failed_subjects.len(),
        gpa: weighted_gpa(records),
        failed_subjects,
    }
}

/// `round(sum(credits * points) / sum(credits), 2)` over credit-bearing rows,
/// or 0.0 when no credits are left.
pub fn weighted_gpa(records: &[GradeRecord]) -> f64 {
    let (total_credits, total_points) = records
        .iter()
        .filter(|record| !record.grade.is_pass_marker())
        .fold((0.0, 0.0), |(credits, points), record| {
            (
                credits + record.credits,
                points + record.credits * record.points as f64,
            )
        });

    if total_credits == 0.0 {
        0.0
    } else {
        round2(total_points / total_credits)
    }
}

pub fn credit_total(records: &[GradeRecord]) -> f64 {
    records
        .iter()
        .filter(|record| !record.grade.is_pass_marker())
        .map(|record| record.credits)
        .sum()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One summary per caller-supplied key, e.g. roll number or term.
pub fn summarize_by<K, F>(records: &[GradeRecord], key: F) -> BTreeMap<K, StudentTermSummary>
where
    K: Ord,
    F: Fn(&GradeRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<GradeRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record.clone());
    }

    groups
        .into_iter()
        .map(|(group, members)| (group, summarize(&members)))
        .collect()
}

/// Unions records from several memos. For a subject seen more than once the
/// row with the higher points wins, so a cleared backlog replaces the failed
/// attempt. Subjects are matched by title only, which also folds together
/// distinct subjects that happen to share a title in different terms.
pub fn merge_history(records: &[GradeRecord]) -> Vec<GradeRecord> {
    let mut ranked: Vec<&GradeRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.points.cmp(&a.points));

    let mut seen = HashSet::new();
    let mut merged: Vec<GradeRecord> = ranked
        .into_iter()
        .filter(|record| seen.insert(record.subject.as_str()))
        .cloned()
        .collect();

    merged.sort_by(|a, b| a.term.cmp(&b.term).then_with(|| a.subject.cmp(&b.subject)));
    merged
}

/// One summary per roll number. Re-attempts are merged within each student,
/// never across students.
pub fn summarize_students(records: &[GradeRecord]) -> BTreeMap<String, StudentTermSummary> {
    let mut students: BTreeMap<String, Vec<GradeRecord>> = BTreeMap::new();
    for record in records {
        students
            .entry(record.student_id.clone())
            .or_default()
            .push(record.clone());
    }

    students
        .into_iter()
        .map(|(student, rows)| (student, summarize(&merge_history(&rows))))
        .collect()
}

pub fn transcript(records: &[GradeRecord]) -> TranscriptSummary {
    let history = merge_history(records);
    let terms: Vec<TermSummary> = summarize_by(&history, |record| record.term.clone())
        .into_iter()
        .map(|(term, summary)| TermSummary { term, summary })
        .collect();

    TranscriptSummary {
        overall: summarize(&history),
        total_credits: credit_total(&history),
        term_count: terms.len(),
        terms,
    }
}
