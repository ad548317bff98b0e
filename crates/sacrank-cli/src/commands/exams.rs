//! Exam list management commands for CLI.

use clap::Subcommand;
use sacrank_core::store::{self, format_due};
use sacrank_core::{DifficultyLevel, ExamRecord};
use std::path::PathBuf;

use super::load_context;

#[derive(Subcommand)]
pub enum ExamsAction {
    /// Add an exam to the exams file
    Add {
        /// Exam name
        name: String,
        /// Due date (YYYY-MM-DD[ HH:MM])
        date: String,
        /// Subject
        #[arg(long)]
        subject: String,
        /// Difficulty: Low, Medium, High, or a number in [0, 1]
        #[arg(long, default_value = "Low")]
        difficulty: String,
    },
    /// List exams in file order
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every exam from the exams file
    Clear,
}

pub fn run(action: ExamsAction, data_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (_, paths) = load_context(data_dir)?;

    match action {
        ExamsAction::Add {
            name,
            date,
            subject,
            difficulty,
        } => {
            if name.trim().is_empty() {
                return Err("exam name must not be empty".into());
            }
            let due = store::parse_due(&date)
                .ok_or_else(|| format!("invalid date '{date}' (expected YYYY-MM-DD[ HH:MM])"))?;
            let record = ExamRecord::new(name, due, subject);
            let record = if DifficultyLevel::is_label(&difficulty) {
                record.with_level(DifficultyLevel::from_label(&difficulty))
            } else {
                let value: f64 = difficulty
                    .parse()
                    .map_err(|_| format!("invalid difficulty '{difficulty}'"))?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(format!("difficulty must be in [0, 1], got {value}").into());
                }
                record.with_scalar(value)
            };
            store::append_exam(&paths.exams, &record)?;
            println!("Exam added: {}", record.name);
        }
        ExamsAction::List { json } => {
            let loaded = store::load_exams(&paths.exams)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&loaded.records)?);
            } else {
                for record in &loaded.records {
                    println!(
                        "{} | {} | {} | {:?}",
                        record.name,
                        format_due(record.due),
                        record.subject,
                        record.difficulty
                    );
                }
            }
            for row in &loaded.skipped {
                eprintln!("warning: skipped line {}: {}", row.line, row.reason);
            }
        }
        ExamsAction::Clear => {
            store::save_exams(&paths.exams, &[])?;
            println!("exams cleared");
        }
    }
    Ok(())
}
