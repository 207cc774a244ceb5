//! Grade memo extraction and grade-point aggregation.
//!
//! [`extract`] turns page texts of a grade memo into [`models::GradeRecord`]
//! rows; [`gpa`] summarizes any set of rows into backlogs and GPA.

pub mod extract;
pub mod gpa;
pub mod ingest;
pub mod models;
pub mod report;
