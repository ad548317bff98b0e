//! CSV record store.
//!
//! Reads the flat files the study tracker keeps under its data directory:
//!
//! - `exams.csv`: header-less `name,date,difficulty,subject` rows
//! - `study_scores.csv`: `SAC,Subject,Score[,Percentage]`
//! - `target_scores.csv`: `Subject,Target_Score`
//! - `difficulty.csv`: `Subject,...,difficulty`
//!
//! Malformed rows never reach the ranking core; they are skipped here and
//! reported back as [`SkippedRow`]s.

mod exams;
mod scores;

pub use exams::{append_exam, format_due, load_exams, parse_due, read_exams, save_exams};
pub use scores::{
    current_scores, load_difficulties, load_study_scores, load_target_scores, read_difficulties,
    read_study_scores, read_target_scores, ScoreRow, TOTAL_ROW,
};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::MAX_STUDY_SCORE;
use crate::record::{DifficultyInput, ExamRecord};

/// A CSV row that was dropped during loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the source file
    pub line: u64,
    pub reason: String,
}

/// Exams loaded from disk plus the rows that could not be used.
#[derive(Debug, Clone, Default)]
pub struct LoadedExams {
    pub records: Vec<ExamRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Locations of the data files.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub exams: PathBuf,
    pub study_scores: PathBuf,
    pub target_scores: PathBuf,
    pub difficulty: PathBuf,
}

impl DataPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            exams: dir.join("exams.csv"),
            study_scores: dir.join("study_scores.csv"),
            target_scores: dir.join("target_scores.csv"),
            difficulty: dir.join("difficulty.csv"),
        }
    }
}

/// Where a record's difficulty comes from when loading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DifficultySource {
    /// The exams file's own difficulty column
    #[default]
    Exams,
    /// Current and target study scores of the exam's subject
    Performance,
    /// Per-subject value from `difficulty.csv`, falling back to the exams column
    Subject,
}

impl std::str::FromStr for DifficultySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exams" => Ok(DifficultySource::Exams),
            "performance" => Ok(DifficultySource::Performance),
            "subject" => Ok(DifficultySource::Subject),
            other => Err(format!(
                "unknown difficulty source '{other}' (expected exams, performance or subject)"
            )),
        }
    }
}

/// Load exams and attach difficulty inputs from the chosen source.
///
/// With [`DifficultySource::Performance`], a subject with no current score
/// is treated as 0 and one with no target as 50.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if the exams file is missing, or a
/// CSV/IO error from any file that exists but cannot be read.
pub fn load_exams_with_source(
    paths: &DataPaths,
    source: DifficultySource,
) -> Result<LoadedExams, StoreError> {
    let mut loaded = load_exams(&paths.exams)?;

    match source {
        DifficultySource::Exams => {}
        DifficultySource::Performance => {
            let current = current_scores(&load_study_scores(&paths.study_scores)?);
            let targets = load_target_scores(&paths.target_scores)?;
            attach_performance(&mut loaded.records, &current, &targets);
        }
        DifficultySource::Subject => {
            let difficulties = load_difficulties(&paths.difficulty)?;
            for record in &mut loaded.records {
                if let Some(value) = difficulties.get(&record.subject) {
                    record.difficulty = DifficultyInput::Scalar(*value);
                }
            }
        }
    }

    tracing::debug!(
        records = loaded.records.len(),
        skipped = loaded.skipped.len(),
        ?source,
        "exams loaded"
    );
    Ok(loaded)
}

/// Replace each record's difficulty with its subject's performance inputs.
pub fn attach_performance(
    records: &mut [ExamRecord],
    current: &HashMap<String, f64>,
    targets: &HashMap<String, f64>,
) {
    for record in records {
        record.difficulty = DifficultyInput::Performance {
            current_score: Some(current.get(&record.subject).copied().unwrap_or(0.0)),
            target_score: Some(
                targets
                    .get(&record.subject)
                    .copied()
                    .unwrap_or(MAX_STUDY_SCORE),
            ),
            mark_weight: None,
        };
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> StoreError {
    StoreError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Open an optional data file; `None` when it does not exist.
fn open_optional(path: &Path) -> Result<Option<std::fs::File>, StoreError> {
    match std::fs::File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}
