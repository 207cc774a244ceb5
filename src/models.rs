use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder for a roll number or name that has not been seen yet.
pub const UNKNOWN: &str = "Unknown";

/// Term label for subject codes without a leading digit pair.
pub const OTHER_TERM: &str = "Others";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    O,
    S,
    APlus,
    A,
    B,
    C,
    D,
    E,
    F,
    Ab,
    M,
    Completed,
    Y,
}

impl Grade {
    pub const ALL: [Grade; 13] = [
        Grade::O,
        Grade::S,
        Grade::APlus,
        Grade::A,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::E,
        Grade::F,
        Grade::Ab,
        Grade::M,
        Grade::Completed,
        Grade::Y,
    ];

    /// Case-insensitive lookup in the grade vocabulary.
    pub fn from_symbol(token: &str) -> Option<Grade> {
        let upper = token.trim().to_ascii_uppercase();
        Grade::ALL.into_iter().find(|grade| grade.symbol() == upper)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Grade::O => "O",
            Grade::S => "S",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
            Grade::Ab => "AB",
            Grade::M => "M",
            Grade::Completed => "COMPLETED",
            Grade::Y => "Y",
        }
    }

    pub fn points(self) -> u32 {
        match self {
            Grade::O | Grade::S | Grade::APlus => 10,
            Grade::A => 9,
            Grade::B => 8,
            Grade::C => 7,
            Grade::D => 6,
            Grade::E => 5,
            Grade::F | Grade::Ab | Grade::M | Grade::Completed | Grade::Y => 0,
        }
    }

    /// Failed or unresolved attempt; counts as a backlog.
    pub fn is_failure(self) -> bool {
        matches!(self, Grade::F | Grade::Ab | Grade::M)
    }

    /// Non-credit completion marker, kept in history but left out of GPA math.
    pub fn is_pass_marker(self) -> bool {
        matches!(self, Grade::Completed | Grade::Y)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<String> for Grade {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Grade::from_symbol(&value)
            .ok_or_else(|| anyhow::anyhow!("unknown grade symbol {value:?}"))
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.symbol().to_string()
    }
}

/// One subject result. Field names follow the tabular interchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    #[serde(rename = "RollNo")]
    pub student_id: String,
    #[serde(rename = "StudentName")]
    pub student_name: String,
    #[serde(rename = "Semester")]
    pub term: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Grade")]
    pub grade: Grade,
    #[serde(rename = "Credits")]
    pub credits: f64,
    #[serde(rename = "Points")]
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StudentTermSummary {
    pub backlog_count: usize,
    pub gpa: f64,
    pub failed_subjects: Vec<String>,
}

impl StudentTermSummary {
    pub fn failed_subjects_display(&self) -> String {
        self.failed_subjects.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermSummary {
    pub term: String,
    pub summary: StudentTermSummary,
}

/// Whole-history view over merged documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptSummary {
    pub overall: StudentTermSummary,
    pub total_credits: f64,
    pub term_count: usize,
    pub terms: Vec<TermSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_lookup_is_case_insensitive() {
        assert_eq!(Grade::from_symbol("a+"), Some(Grade::APlus));
        assert_eq!(Grade::from_symbol("ab"), Some(Grade::Ab));
        assert_eq!(Grade::from_symbol("Completed"), Some(Grade::Completed));
        assert_eq!(Grade::from_symbol("P"), None);
        assert_eq!(Grade::from_symbol("3"), None);
    }

    #[test]
    fn vocabulary_weights() {
        let weights: Vec<u32> = Grade::ALL.iter().map(|g| g.points()).collect();
        assert_eq!(weights, vec![10, 10, 10, 9, 8, 7, 6, 5, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn failure_and_pass_marker_sets_are_disjoint() {
        let failures: Vec<Grade> = Grade::ALL.into_iter().filter(|g| g.is_failure()).collect();
        let markers: Vec<Grade> = Grade::ALL
            .into_iter()
            .filter(|g| g.is_pass_marker())
            .collect();
        assert_eq!(failures, vec![Grade::F, Grade::Ab, Grade::M]);
        assert_eq!(markers, vec![Grade::Completed, Grade::Y]);
    }

    #[test]
    fn failed_subjects_join_for_display() {
        let summary = StudentTermSummary {
            backlog_count: 2,
            gpa: 0.0,
            failed_subjects: vec!["Physics".to_string(), "Java".to_string()],
        };
        assert_eq!(summary.failed_subjects_display(), "Physics, Java");
    }
}
