use std::fmt::Write;

use chrono::NaiveDate;

use crate::gpa;
use crate::models::{GradeRecord, UNKNOWN};

fn status(record: &GradeRecord) -> &'static str {
    if record.grade.is_failure() {
        "FAIL"
    } else {
        "PASS"
    }
}

fn identity(records: &[GradeRecord]) -> (&str, &str) {
    let roll_no = records
        .iter()
        .map(|r| r.student_id.as_str())
        .find(|id| *id != UNKNOWN)
        .unwrap_or(UNKNOWN);
    let name = records
        .iter()
        .map(|r| r.student_name.as_str())
        .find(|name| *name != UNKNOWN)
        .unwrap_or(UNKNOWN);
    (roll_no, name)
}

pub fn build_report(records: &[GradeRecord], generated_on: NaiveDate) -> String {
    let history = gpa::merge_history(records);
    let summary = gpa::transcript(records);
    let (roll_no, name) = identity(&history);

    let mut output = String::new();

    let _ = writeln!(output, "# Grade Memo Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) on {}",
        name, roll_no, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Backlogs");

    let failed: Vec<&GradeRecord> = history.iter().filter(|r| r.grade.is_failure()).collect();
    if failed.is_empty() {
        let _ = writeln!(output, "All clear, no backlogs.");
    } else {
        let _ = writeln!(output, "{} active backlogs.", failed.len());
        let _ = writeln!(output);
        let _ = writeln!(output, "| Semester | Subject | Grade |");
        let _ = writeln!(output, "|---|---|---|");
        for record in failed {
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                record.term, record.subject, record.grade
            );
        }
    }

    for term in &summary.terms {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Semester {}", term.term);
        let _ = writeln!(output, "SGPA {:.2}", term.summary.gpa);
        let _ = writeln!(output);
        let _ = writeln!(output, "| Subject | Grade | Status | Credits |");
        let _ = writeln!(output, "|---|---|---|---|");
        for record in history.iter().filter(|r| r.term == term.term) {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                record.subject,
                record.grade,
                status(record),
                record.credits
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");
    let _ = writeln!(output, "- Total credits: {}", summary.total_credits);
    let _ = writeln!(output, "- Semesters: {}", summary.term_count);
    let _ = writeln!(output, "- CGPA: {:.2}", summary.overall.gpa);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::demo_records;
    use crate::models::Grade;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()
    }

    #[test]
    fn report_lists_backlogs_terms_and_cgpa() {
        let report = build_report(&demo_records(), date());

        assert!(report.starts_with("# Grade Memo Report\n"));
        assert!(report.contains("Generated for LEKKALA DIVAKAR REDDY (22HJ1A4311) on 2026-02-02"));
        assert!(report.contains("2 active backlogs."));
        assert!(report.contains("| 1-1 | Physics | F |"));
        assert!(report.contains("| 2-1 | Java | F |"));
        assert!(report.contains("## Semester 1-1\nSGPA 5.67"));
        assert!(report.contains("## Semester 1-2\nSGPA 9.00"));
        assert!(report.contains("| Physics | F | FAIL | 3 |"));
        assert!(report.contains("- Total credits: 18"));
        assert!(report.contains("- Semesters: 3"));
        assert!(report.contains("- CGPA: 5.83"));
    }

    #[test]
    fn cleared_backlog_reports_all_clear() {
        let mut records = demo_records();
        for record in records.iter_mut().filter(|r| r.grade == Grade::F) {
            record.grade = Grade::D;
            record.points = Grade::D.points();
        }

        let report = build_report(&records, date());
        assert!(report.contains("All clear, no backlogs."));
        assert!(!report.contains("FAIL"));
    }

    #[test]
    fn unknown_identity_is_reported_as_such() {
        let mut records = demo_records();
        for record in records.iter_mut() {
            record.student_id = UNKNOWN.to_string();
            record.student_name = UNKNOWN.to_string();
        }
        let report = build_report(&records, date());
        assert!(report.contains("Generated for Unknown (Unknown)"));
    }
}
