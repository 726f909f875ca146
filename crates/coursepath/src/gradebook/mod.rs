//! Import learner progress from an LMS gradebook CSV export.

mod parser;

use std::collections::hash_map::Entry;
use std::io::Read;
use std::path::Path;

use crate::learning_paths::{CourseId, LearnerProgressSnapshot, ProgressMap};
use parser::GradebookRecord;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum GradebookImportError {
    #[error("failed to read gradebook export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid gradebook CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: score '{value}' is not a number")]
    InvalidScore { line: usize, value: String },
    #[error("line {line}: completion date '{value}' is not RFC 3339 or YYYY-MM-DD")]
    InvalidDate { line: usize, value: String },
}

pub struct GradebookImporter;

impl GradebookImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ProgressMap, GradebookImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows for the same course merge: completed if any row is, highest score, earliest
    /// completion date.
    pub fn from_reader<R: Read>(reader: R) -> Result<ProgressMap, GradebookImportError> {
        let mut progress = ProgressMap::new();
        let mut rows = 0usize;

        for record in parser::parse_records(reader)? {
            rows += 1;
            merge_record(&mut progress, record);
        }

        debug!(rows, courses = progress.len(), "imported gradebook progress");
        Ok(progress)
    }
}

fn merge_record(progress: &mut ProgressMap, record: GradebookRecord) {
    let course_id = CourseId(record.course_id);
    let snapshot = match progress.entry(course_id.clone()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => entry.insert(LearnerProgressSnapshot::not_started(course_id)),
    };

    if let Some(completed_on) = record.completed_on {
        snapshot.completed = true;
        snapshot.completed_on = Some(match snapshot.completed_on {
            Some(existing) => existing.min(completed_on),
            None => completed_on,
        });
    }

    if let Some(score) = record.score {
        snapshot.score = Some(match snapshot.score {
            Some(existing) => existing.max(score),
            None => score,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    #[test]
    fn merges_repeated_attempts() {
        let csv = "Course ID,Completed At,Score\n\
intro,,55\n\
intro,2025-02-01T10:00:00Z,72%\n\
intro,2025-01-20,64\n";

        let progress = GradebookImporter::from_reader(Cursor::new(csv)).expect("import succeeds");
        let intro = progress
            .get(&CourseId::from("intro"))
            .expect("intro imported");

        assert!(intro.completed);
        assert_eq!(intro.score, Some(72.0));
        assert_eq!(
            intro.completed_on,
            Some(NaiveDate::from_ymd_opt(2025, 1, 20).expect("valid date"))
        );
    }

    #[test]
    fn rejects_unparseable_scores_with_line_number() {
        let csv = "Course ID,Completed At,Score\nintro,2025-02-01,72\nadvanced,,n/a\n";

        match GradebookImporter::from_reader(Cursor::new(csv)) {
            Err(GradebookImportError::InvalidScore { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "n/a");
            }
            other => panic!("expected invalid score, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unparseable_completion_dates() {
        let csv = "Course ID,Completed At,Score\nintro,03/14/2025,88\n";

        match GradebookImporter::from_reader(Cursor::new(csv)) {
            Err(GradebookImportError::InvalidDate { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "03/14/2025");
            }
            other => panic!("expected invalid date, got {other:?}"),
        }
    }

    #[test]
    fn line_numbers_account_for_multiline_fields() {
        let csv = "Course ID,Notes,Score\n\
intro,\"retook the quiz\nafter review\",80\n\
advanced,,n/a\n";

        match GradebookImporter::from_reader(Cursor::new(csv)) {
            Err(GradebookImportError::InvalidScore { line, value }) => {
                assert_eq!(line, 4);
                assert_eq!(value, "n/a");
            }
            other => panic!("expected invalid score, got {other:?}"),
        }
    }
}
