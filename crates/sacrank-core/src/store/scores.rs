use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::{csv_error, open_optional};
use crate::error::StoreError;
use crate::model::MAX_STUDY_SCORE;

/// Label of the per-subject row holding the current study score.
pub const TOTAL_ROW: &str = "Total";

/// One row of the study scores file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    /// Assessment label, e.g. "SAC 2" or "Total"
    pub sac: String,
    pub subject: String,
    /// `None` when the cell is empty or not a number
    pub score: Option<f64>,
    pub percentage: Option<String>,
}

impl ScoreRow {
    pub fn is_total(&self) -> bool {
        self.sac == TOTAL_ROW
    }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Position of the first header matching any of `names`, ignoring case.
fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| !v.is_nan())
}

/// Parse `SAC,Subject,Score[,Percentage]` rows.
///
/// # Errors
///
/// Returns the underlying CSV error if the input cannot be tokenised.
pub fn read_study_scores<R: Read>(input: R) -> Result<Vec<ScoreRow>, csv::Error> {
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();
    let (Some(sac), Some(subject), Some(score)) = (
        column(&headers, &["SAC"]),
        column(&headers, &["Subject"]),
        column(&headers, &["Score"]),
    ) else {
        return Ok(Vec::new());
    };
    let percentage = column(&headers, &["Percentage"]);

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let subject = record.get(subject).unwrap_or_default();
        if subject.is_empty() {
            continue;
        }
        rows.push(ScoreRow {
            sac: record.get(sac).unwrap_or_default().to_string(),
            subject: subject.to_string(),
            score: parse_number(record.get(score)),
            percentage: percentage
                .and_then(|i| record.get(i))
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        });
    }
    Ok(rows)
}

/// Load the study scores file; a missing file yields no rows.
///
/// # Errors
///
/// Returns an IO or CSV error if the file exists but cannot be read.
pub fn load_study_scores(path: &Path) -> Result<Vec<ScoreRow>, StoreError> {
    match open_optional(path)? {
        Some(file) => read_study_scores(file).map_err(|e| csv_error(path, e)),
        None => Ok(Vec::new()),
    }
}

/// Current study score per subject, taken from the `Total` rows.
pub fn current_scores(rows: &[ScoreRow]) -> HashMap<String, f64> {
    rows.iter()
        .filter(|r| r.is_total())
        .filter_map(|r| r.score.map(|s| (r.subject.clone(), s)))
        .collect()
}

/// Parse `Subject,Target_Score` rows, keeping values within [0, 50].
///
/// # Errors
///
/// Returns the underlying CSV error if the input cannot be tokenised.
pub fn read_target_scores<R: Read>(input: R) -> Result<HashMap<String, f64>, csv::Error> {
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();
    let (Some(subject), Some(target)) = (
        column(&headers, &["Subject"]),
        column(&headers, &["Target_Score"]),
    ) else {
        return Ok(HashMap::new());
    };

    let mut targets = HashMap::new();
    for record in rdr.records() {
        let record = record?;
        let Some(value) = parse_number(record.get(target)) else {
            continue;
        };
        if (0.0..=MAX_STUDY_SCORE).contains(&value) {
            targets.insert(record.get(subject).unwrap_or_default().to_string(), value);
        }
    }
    Ok(targets)
}

/// Load target scores; a missing file yields an empty map.
///
/// # Errors
///
/// Returns an IO or CSV error if the file exists but cannot be read.
pub fn load_target_scores(path: &Path) -> Result<HashMap<String, f64>, StoreError> {
    match open_optional(path)? {
        Some(file) => read_target_scores(file).map_err(|e| csv_error(path, e)),
        None => Ok(HashMap::new()),
    }
}

/// Parse a per-subject difficulty table with `Subject` and `difficulty`
/// columns in either case.
///
/// # Errors
///
/// Returns the underlying CSV error if the input cannot be tokenised.
pub fn read_difficulties<R: Read>(input: R) -> Result<HashMap<String, f64>, csv::Error> {
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();
    let (Some(subject), Some(difficulty)) = (
        column(&headers, &["Subject"]),
        column(&headers, &["difficulty"]),
    ) else {
        return Ok(HashMap::new());
    };

    let mut difficulties = HashMap::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(value) = parse_number(record.get(difficulty)) {
            difficulties.insert(record.get(subject).unwrap_or_default().to_string(), value);
        }
    }
    Ok(difficulties)
}

/// Load the per-subject difficulty table; a missing file yields an empty map.
///
/// # Errors
///
/// Returns an IO or CSV error if the file exists but cannot be read.
pub fn load_difficulties(path: &Path) -> Result<HashMap<String, f64>, StoreError> {
    match open_optional(path)? {
        Some(file) => read_difficulties(file).map_err(|e| csv_error(path, e)),
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_scores_keep_blank_and_bad_scores_as_none() {
        let input = "\
SAC,Subject,Score,Percentage
SAC 1,Biology,35,70%
SAC 2,Biology,,
SAC 3,Biology,abc,
Total,Biology,31.5,
";
        let rows = read_study_scores(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].score, Some(35.0));
        assert_eq!(rows[0].percentage.as_deref(), Some("70%"));
        assert_eq!(rows[1].score, None);
        assert_eq!(rows[2].score, None);
        assert!(rows[3].is_total());

        let current = current_scores(&rows);
        assert_eq!(current.get("Biology"), Some(&31.5));
    }

    #[test]
    fn study_scores_without_expected_columns_are_empty() {
        let rows = read_study_scores("name,value\na,1\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn target_scores_out_of_range_are_dropped() {
        let input = "\
Subject,Target_Score
Biology,40
Chemistry,55
Physics,-1
English,n/a
Methods,0
";
        let targets = read_target_scores(input.as_bytes()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets["Biology"], 40.0);
        assert_eq!(targets["Methods"], 0.0);
    }

    #[test]
    fn difficulties_accept_either_header_case() {
        let lower = "subject,difficulty\nBiology,0.4\nChemistry,nan\n";
        let upper = "Subject,Difficulty\nBiology,0.4\n";
        assert_eq!(read_difficulties(lower.as_bytes()).unwrap().len(), 1);
        assert_eq!(read_difficulties(upper.as_bytes()).unwrap()["Biology"], 0.4);
    }

    #[test]
    fn missing_optional_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_study_scores(&dir.path().join("none.csv")).unwrap().is_empty());
        assert!(load_target_scores(&dir.path().join("none.csv")).unwrap().is_empty());
        assert!(load_difficulties(&dir.path().join("none.csv")).unwrap().is_empty());
    }
}
