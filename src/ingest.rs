use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::extract::{Extractor, LineParser};
use crate::models::{Grade, GradeRecord, UNKNOWN};

/// Page separator emitted by PDF-to-text tools.
pub const PAGE_BREAK: char = '\u{c}';

pub fn split_pages(text: &str) -> Vec<String> {
    text.split(PAGE_BREAK).map(str::to_string).collect()
}

pub fn read_pages(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read memo text from {}", path.display()))?;
    Ok(split_pages(&text))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Loads one document. CSV files are taken as already tabulated rows, every
/// other file as memo page text. `Ok(None)` means the document held no rows.
pub fn load_document<P: LineParser>(
    path: &Path,
    extractor: &Extractor<P>,
) -> anyhow::Result<Option<Vec<GradeRecord>>> {
    let records = if is_csv(path) {
        let rows = read_csv(path)?;
        Some(rows).filter(|rows| !rows.is_empty())
    } else {
        let pages = read_pages(path)?;
        extractor.extract(&pages)
    };

    match &records {
        Some(rows) => info!(path = %path.display(), records = rows.len(), "document loaded"),
        None => warn!(path = %path.display(), "no grade rows found"),
    }
    Ok(records)
}

/// Loads every document, leaving out the ones without rows.
pub fn load_documents<P: LineParser>(
    paths: &[std::path::PathBuf],
    extractor: &Extractor<P>,
) -> anyhow::Result<Vec<GradeRecord>> {
    let mut records = Vec::new();
    for path in paths {
        if let Some(rows) = load_document(path, extractor)? {
            records.extend(rows);
        }
    }
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "RollNo", default)]
    roll_no: Option<String>,
    #[serde(rename = "StudentName", default)]
    student_name: Option<String>,
    #[serde(rename = "Semester")]
    semester: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Grade")]
    grade: String,
    #[serde(rename = "Credits")]
    credits: f64,
    #[serde(rename = "Points", default)]
    points: Option<f64>,
}

pub fn read_csv(path: &Path) -> anyhow::Result<Vec<GradeRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_csv_from(file)
}

/// Reads interchange rows. Rows with an unknown grade or unreadable fields
/// are skipped; points always come from the grade vocabulary.
pub fn read_csv_from<R: Read>(reader: R) -> anyhow::Result<Vec<GradeRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (idx, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!(row = idx + 1, error = %err, "skipping unreadable row");
                continue;
            }
        };

        let Some(grade) = Grade::from_symbol(&row.grade) else {
            warn!(row = idx + 1, grade = %row.grade, "skipping row with unknown grade");
            continue;
        };

        if let Some(points) = row.points {
            if points != f64::from(grade.points()) {
                debug!(
                    row = idx + 1,
                    points,
                    expected = grade.points(),
                    "points column disagrees with grade"
                );
            }
        }

        records.push(GradeRecord {
            student_id: non_empty_or_unknown(row.roll_no),
            student_name: non_empty_or_unknown(row.student_name),
            term: row.semester,
            subject: row.subject,
            grade,
            credits: row.credits,
            points: grade.points(),
        });
    }

    Ok(records)
}

fn non_empty_or_unknown(value: Option<String>) -> String {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn write_csv<W: Write>(records: &[GradeRecord], writer: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[GradeRecord], writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

pub fn demo_records() -> Vec<GradeRecord> {
    let rows = [
        ("1-1", "Python", Grade::B),
        ("1-1", "Maths-I", Grade::A),
        ("1-1", "Physics", Grade::F),
        ("1-2", "Data Structures", Grade::S),
        ("1-2", "Maths-II", Grade::B),
        ("2-1", "Java", Grade::F),
    ];

    rows.into_iter()
        .map(|(term, subject, grade)| GradeRecord {
            student_id: "22HJ1A4311".to_string(),
            student_name: "LEKKALA DIVAKAR REDDY".to_string(),
            term: term.to_string(),
            subject: subject.to_string(),
            grade,
            credits: 3.0,
            points: grade.points(),
        })
        .collect()
}
