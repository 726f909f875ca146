use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::GradebookImportError;

#[derive(Debug)]
pub(crate) struct GradebookRecord {
    pub(crate) course_id: String,
    pub(crate) completed_on: Option<NaiveDate>,
    pub(crate) score: Option<f32>,
}

pub(crate) fn parse_records<R: Read>(
    reader: R,
) -> Result<Vec<GradebookRecord>, GradebookImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or_default();
        let row: GradebookRow = record.deserialize(Some(&headers))?;
        let course_id = row.course_id.trim().to_string();
        if course_id.is_empty() {
            continue;
        }

        let score = row
            .score
            .as_deref()
            .map(|raw| {
                parse_score(raw).ok_or_else(|| GradebookImportError::InvalidScore {
                    line,
                    value: raw.to_string(),
                })
            })
            .transpose()?;
        let completed_on = row
            .completed_at
            .as_deref()
            .map(|raw| {
                parse_date(raw).ok_or_else(|| GradebookImportError::InvalidDate {
                    line,
                    value: raw.to_string(),
                })
            })
            .transpose()?;

        records.push(GradebookRecord {
            course_id,
            completed_on,
            score,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct GradebookRow {
    #[serde(rename = "Course ID")]
    course_id: String,
    #[serde(
        rename = "Completed At",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    completed_at: Option<String>,
    #[serde(rename = "Score", default, deserialize_with = "empty_string_as_none")]
    score: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Accepts `70`, `69.5` and `70%`.
pub(crate) fn parse_score(value: &str) -> Option<f32> {
    let trimmed = value.trim();
    let numeric = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    numeric
        .parse::<f32>()
        .ok()
        .filter(|score| score.is_finite())
}
