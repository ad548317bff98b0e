//! Per-subject score analytics.
//!
//! Summaries computed from the study scores table: subject averages, a
//! score-derived difficulty per subject, progress against a target study
//! score and a per-subject assessment breakdown.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::store::ScoreRow;

/// Planned assessments per subject when no override is given.
pub const DEFAULT_PLANNED_TESTS: u32 = 7;

/// Average score of one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject: String,
    /// Mean score rounded to 2 decimals
    pub average: f64,
}

/// Score-derived difficulty of one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectDifficulty {
    pub subject: String,
    pub tests_taken: usize,
    /// Mean score rounded to 2 decimals
    pub mean_score: f64,
    pub planned_tests: u32,
    /// `(1 - mean/100) * planned/taken`, rounded to 4 decimals
    pub difficulty: f64,
}

/// Progress of a current study score towards a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Progress {
    Achieved { current: f64 },
    Needs { improvement: f64, target: f64 },
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Progress::Achieved { current } => write!(f, "Target achieved: {current:.1}/50"),
            Progress::Needs {
                improvement,
                target,
            } => write!(f, "Need +{improvement:.1} points (target: {target:.1}/50)"),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Scores per subject, skipping `Total` rows and empty cells.
fn scores_by_subject(rows: &[ScoreRow]) -> BTreeMap<&str, Vec<f64>> {
    let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.is_total()) {
        if let Some(score) = row.score {
            grouped.entry(row.subject.as_str()).or_default().push(score);
        }
    }
    grouped
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean assessment score per subject, ordered by subject name.
pub fn subject_averages(rows: &[ScoreRow]) -> Vec<SubjectAverage> {
    scores_by_subject(rows)
        .into_iter()
        .map(|(subject, scores)| SubjectAverage {
            subject: subject.to_string(),
            average: round_to(mean(&scores), 2),
        })
        .collect()
}

/// Score-derived difficulty per subject, ordered by subject name.
///
/// Subjects missing from `planned` use [`DEFAULT_PLANNED_TESTS`].
pub fn subject_difficulty(
    rows: &[ScoreRow],
    planned: &HashMap<String, u32>,
) -> Vec<SubjectDifficulty> {
    scores_by_subject(rows)
        .into_iter()
        .map(|(subject, scores)| {
            let tests_taken = scores.len();
            let mean_score = mean(&scores);
            let planned_tests = planned
                .get(subject)
                .copied()
                .unwrap_or(DEFAULT_PLANNED_TESTS);
            let factor = f64::from(planned_tests) / tests_taken as f64;
            SubjectDifficulty {
                subject: subject.to_string(),
                tests_taken,
                mean_score: round_to(mean_score, 2),
                planned_tests,
                difficulty: round_to((1.0 - mean_score / 100.0) * factor, 4),
            }
        })
        .collect()
}

/// Compare a current study score with a target.
pub fn progress(current: f64, target: f64) -> Progress {
    if current >= target {
        Progress::Achieved { current }
    } else {
        Progress::Needs {
            improvement: target - current,
            target,
        }
    }
}

/// Scored, non-total rows for `subject` in file order.
pub fn sac_breakdown<'a>(rows: &'a [ScoreRow], subject: &str) -> Vec<&'a ScoreRow> {
    rows.iter()
        .filter(|r| r.subject == subject && !r.is_total() && !r.sac.is_empty())
        .filter(|r| r.score.is_some())
        .collect()
}

/// Serialize subject difficulties in the `difficulty.csv` layout.
///
/// # Errors
///
/// Returns the CSV error if a row cannot be written.
pub fn write_difficulty_table<W: std::io::Write>(
    out: W,
    table: &[SubjectDifficulty],
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Subject", "tests_taken", "mean_score", "planned_tests", "difficulty"])?;
    for row in table {
        writer.write_record([
            row.subject.clone(),
            row.tests_taken.to_string(),
            row.mean_score.to_string(),
            row.planned_tests.to_string(),
            row.difficulty.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::read_difficulties;

    fn row(sac: &str, subject: &str, score: Option<f64>) -> ScoreRow {
        ScoreRow {
            sac: sac.into(),
            subject: subject.into(),
            score,
            percentage: None,
        }
    }

    fn sample() -> Vec<ScoreRow> {
        vec![
            row("SAC 1", "Chemistry", Some(60.0)),
            row("SAC 2", "Chemistry", Some(70.0)),
            row("SAC 1", "Biology", Some(80.0)),
            row("SAC 2", "Biology", None),
            row("Total", "Biology", Some(33.0)),
        ]
    }

    #[test]
    fn averages_skip_totals_and_blanks() {
        let averages = subject_averages(&sample());
        assert_eq!(
            averages,
            vec![
                SubjectAverage {
                    subject: "Biology".into(),
                    average: 80.0
                },
                SubjectAverage {
                    subject: "Chemistry".into(),
                    average: 65.0
                },
            ]
        );
    }

    #[test]
    fn difficulty_scales_by_planned_over_taken() {
        let mut planned = HashMap::new();
        planned.insert("Chemistry".to_string(), 6);
        let table = subject_difficulty(&sample(), &planned);

        let bio = &table[0];
        assert_eq!(bio.tests_taken, 1);
        assert_eq!(bio.planned_tests, DEFAULT_PLANNED_TESTS);
        // (1 - 0.8) * 7 / 1
        assert!((bio.difficulty - 1.4).abs() < 1e-9);

        let chem = &table[1];
        assert_eq!(chem.planned_tests, 6);
        // (1 - 0.65) * 6 / 2
        assert!((chem.difficulty - 1.05).abs() < 1e-9);
    }

    #[test]
    fn progress_reports_gap_or_achievement() {
        assert_eq!(progress(42.0, 40.0), Progress::Achieved { current: 42.0 });
        assert_eq!(
            progress(30.0, 40.0),
            Progress::Needs {
                improvement: 10.0,
                target: 40.0
            }
        );
        assert_eq!(
            progress(30.0, 40.0).to_string(),
            "Need +10.0 points (target: 40.0/50)"
        );
    }

    #[test]
    fn breakdown_lists_scored_assessments_in_order() {
        let rows = sample();
        let names: Vec<&str> = sac_breakdown(&rows, "Chemistry")
            .iter()
            .map(|r| r.sac.as_str())
            .collect();
        assert_eq!(names, vec!["SAC 1", "SAC 2"]);
        assert_eq!(sac_breakdown(&rows, "Biology").len(), 1);
    }

    #[test]
    fn difficulty_table_reads_back_through_store() {
        let table = subject_difficulty(&sample(), &HashMap::new());
        let mut buf = Vec::new();
        write_difficulty_table(&mut buf, &table).unwrap();

        let parsed = read_difficulties(buf.as_slice()).unwrap();
        assert_eq!(parsed["Biology"], 1.4);
        assert_eq!(parsed["Chemistry"], 1.225);
    }
}
