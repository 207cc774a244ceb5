use anyhow::Result;

use memo_gpa::extract::extract;
use memo_gpa::gpa::{merge_history, summarize, summarize_by, transcript};
use memo_gpa::ingest::read_csv_from;
use memo_gpa::models::Grade;

const FIRST_SEMESTER: &str = "\
JAWAHARLAL NEHRU TECHNOLOGICAL UNIVERSITY KAKINADA
Memorandum of Grades
Sno Code Subject Credits Grade
R201101 Communicative English 3 B
R201102 Mathematics - I 3 A
R201103 Applied Physics F
R201104 Programming for Problem Solving 15 O
R201105 Environmental Science COMPLETED 0
";

const FIRST_SEMESTER_LAST_PAGE: &str = "\
Student Name : LEKKALA DIVAKAR REDDY
Hall Ticket No : 22HJ1A4311
";

const SUPPLEMENTARY: &str = "\
Hall Ticket No : 22HJ1A4311
Student Name : LEKKALA DIVAKAR REDDY
R201103 Applied Physics 3 C
";

/// Memo spread over two pages with the identity printed at the bottom.
#[test]
fn memo_pages_become_records() -> Result<()> {
    let records = extract(&[FIRST_SEMESTER, FIRST_SEMESTER_LAST_PAGE])
        .ok_or_else(|| anyhow::anyhow!("memo produced no rows"))?;

    assert_eq!(records.len(), 5);
    for record in &records {
        assert_eq!(record.student_id, "22HJ1A4311");
        assert_eq!(record.student_name, "LEKKALA DIVAKAR REDDY");
        assert_eq!(record.term, "1-1");
    }

    let physics = &records[2];
    assert_eq!(physics.grade, Grade::F);
    assert_eq!(physics.credits, 3.0);
    assert_eq!(records[3].credits, 1.5);
    assert_eq!(records[4].grade, Grade::Completed);

    let summary = summarize(&records);
    assert_eq!(summary.backlog_count, 1);
    assert_eq!(summary.failed_subjects, vec!["Applied Physics"]);
    // (8*3 + 9*3 + 0*3 + 10*1.5) / 10.5
    assert_eq!(summary.gpa, 6.29);
    Ok(())
}

/// A supplementary memo clears the backlog once both memos are merged.
#[test]
fn supplementary_memo_clears_backlog() -> Result<()> {
    let mut records = extract(&[FIRST_SEMESTER, FIRST_SEMESTER_LAST_PAGE])
        .ok_or_else(|| anyhow::anyhow!("memo produced no rows"))?;
    let supplementary = extract(&[SUPPLEMENTARY])
        .ok_or_else(|| anyhow::anyhow!("supplementary produced no rows"))?;
    records.extend(supplementary);

    let history = merge_history(&records);
    assert_eq!(history.len(), 5);
    let physics = history
        .iter()
        .find(|r| r.subject == "Applied Physics")
        .ok_or_else(|| anyhow::anyhow!("physics missing"))?;
    assert_eq!(physics.grade, Grade::C);

    let summary = transcript(&records);
    assert_eq!(summary.overall.backlog_count, 0);
    assert_eq!(summary.term_count, 1);
    assert_eq!(summary.total_credits, 10.5);
    Ok(())
}

/// Tabulated rows skip extraction and aggregate the same way.
#[test]
fn csv_rows_and_memo_rows_aggregate_together() -> Result<()> {
    let csv = "\
RollNo,StudentName,Semester,Subject,Grade,Credits,Points
22HJ1A4311,LEKKALA DIVAKAR REDDY,1-2,Data Structures,S,3,10
22HJ1A4311,LEKKALA DIVAKAR REDDY,1-2,Maths-II,B,3,8
";
    let mut records = read_csv_from(csv.as_bytes())?;
    records.extend(extract(&[FIRST_SEMESTER]).unwrap_or_default());

    let by_term = summarize_by(&merge_history(&records), |r| r.term.clone());
    assert_eq!(by_term.len(), 2);
    assert_eq!(by_term["1-2"].gpa, 9.0);
    assert_eq!(by_term["1-1"].backlog_count, 1);
    Ok(())
}
