use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use super::{csv_error, io_error, LoadedExams, SkippedRow};
use crate::error::StoreError;
use crate::record::{DifficultyInput, DifficultyLevel, ExamRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_due(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return date.and_hms_opt(0, 0, 0);
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Inverse of [`parse_due`]; midnight is written as a bare date.
pub fn format_due(due: NaiveDateTime) -> String {
    if due.hour() == 0 && due.minute() == 0 && due.second() == 0 {
        due.format(DATE_FORMAT).to_string()
    } else if due.second() == 0 {
        due.format("%Y-%m-%d %H:%M").to_string()
    } else {
        due.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Load the exams file.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] when the file does not exist.
pub fn load_exams(path: &Path) -> Result<LoadedExams, StoreError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(io_error(path, e)),
    };
    let loaded = read_exams(file).map_err(|e| csv_error(path, e))?;
    for row in &loaded.skipped {
        tracing::warn!(path = %path.display(), line = row.line, reason = %row.reason, "skipped exam row");
    }
    Ok(loaded)
}

/// Parse header-less `name,date,difficulty,subject` rows.
///
/// # Errors
///
/// Returns the underlying CSV error if the input cannot be tokenised.
pub fn read_exams<R: Read>(reader: R) -> Result<LoadedExams, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut loaded = LoadedExams::default();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        if row.iter().all(str::is_empty) {
            continue;
        }
        match parse_exam_row(&row) {
            Ok(record) => loaded.records.push(record),
            Err(reason) => loaded.skipped.push(SkippedRow { line, reason }),
        }
    }
    Ok(loaded)
}

fn parse_exam_row(row: &csv::StringRecord) -> Result<ExamRecord, String> {
    if row.len() != 4 {
        return Err(format!("expected 4 fields, found {}", row.len()));
    }
    let (name, date, difficulty, subject) = (&row[0], &row[1], &row[2], &row[3]);

    if name.is_empty() {
        return Err("empty name".into());
    }
    let due = parse_due(date).ok_or_else(|| format!("unparseable date '{date}'"))?;
    let difficulty = parse_difficulty(difficulty)?;

    Ok(ExamRecord {
        name: name.to_string(),
        due,
        subject: subject.to_string(),
        difficulty,
    })
}

fn parse_difficulty(value: &str) -> Result<DifficultyInput, String> {
    if DifficultyLevel::is_label(value) {
        return Ok(DifficultyInput::Level(DifficultyLevel::from_label(value)));
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_nan() => Err("difficulty is NaN".into()),
        Ok(v) if !(0.0..=1.0).contains(&v) => Err(format!("difficulty {v} outside [0, 1]")),
        Ok(v) => Ok(DifficultyInput::Scalar(v)),
        Err(_) => Err(format!("unparseable difficulty '{value}'")),
    }
}

fn difficulty_field(record: &ExamRecord) -> Result<String, StoreError> {
    match &record.difficulty {
        DifficultyInput::Level(level) => Ok(level.as_str().to_string()),
        DifficultyInput::Scalar(v) => Ok(v.to_string()),
        DifficultyInput::Performance { .. } => Err(StoreError::Unrepresentable(record.name.clone())),
    }
}

/// Every record as an exams-file row. Fails before anything is written.
fn to_rows(records: &[ExamRecord]) -> Result<Vec<[String; 4]>, StoreError> {
    records
        .iter()
        .map(|record| -> Result<[String; 4], StoreError> {
            Ok([
                record.name.clone(),
                format_due(record.due),
                difficulty_field(record)?,
                record.subject.clone(),
            ])
        })
        .collect()
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    rows: &[[String; 4]],
    path: &Path,
) -> Result<(), StoreError> {
    for row in rows {
        writer.write_record(row).map_err(|e| csv_error(path, e))?;
    }
    writer.flush().map_err(|e| io_error(path, e))
}

/// Overwrite the exams file with `records`.
///
/// The file is left untouched when any record cannot be written.
///
/// # Errors
///
/// Fails on IO errors or if a record only carries performance inputs.
pub fn save_exams(path: &Path, records: &[ExamRecord]) -> Result<(), StoreError> {
    let rows = to_rows(records)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    write_rows(&mut writer, &rows, path)
}

/// Append one record to the exams file, creating it if needed.
///
/// # Errors
///
/// Fails on IO errors or if the record only carries performance inputs.
pub fn append_exam(path: &Path, record: &ExamRecord) -> Result<(), StoreError> {
    let rows = to_rows(std::slice::from_ref(record))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    write_rows(&mut writer, &rows, path)
}
