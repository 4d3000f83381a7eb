use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::planning::domain::{CourseId, StudentId};

pub(crate) const UNSPECIFIED_SEMESTER: &str = "unspecified";

#[derive(Debug)]
pub(crate) struct TranscriptRecord {
    pub(crate) line: u64,
    pub(crate) student: StudentId,
    pub(crate) course: CourseId,
    pub(crate) semester: String,
    pub(crate) status: String,
}

/// Reads `student_id,course_id,semester,status` rows. Headers are matched by name, so
/// column order and extra columns do not matter.
pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<TranscriptRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut raw = csv::StringRecord::new();
    let mut records = Vec::new();

    while csv_reader.read_record(&mut raw)? {
        let row: TranscriptRow = raw.deserialize(Some(&headers))?;
        // quoted fields may span lines, so take the line the record starts on
        let line = raw.position().map_or(0, |position| position.line());
        records.push(TranscriptRecord {
            line,
            student: StudentId(row.student_id),
            course: CourseId(row.course_id),
            semester: row
                .semester
                .unwrap_or_else(|| UNSPECIFIED_SEMESTER.to_string()),
            status: row.status,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct TranscriptRow {
    student_id: u64,
    course_id: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    semester: Option<String>,
    status: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
