//! Subject analytics commands for CLI.

use clap::Subcommand;
use sacrank_core::analytics;
use sacrank_core::store;
use serde::Serialize;
use std::path::PathBuf;

use super::load_context;

#[derive(Subcommand)]
pub enum SubjectsAction {
    /// Average assessment score per subject
    Averages {
        #[arg(long)]
        json: bool,
    },
    /// Score-derived difficulty per subject
    Difficulty {
        /// Also write the table to the configured difficulty file
        #[arg(long)]
        write: bool,
        #[arg(long)]
        json: bool,
    },
    /// Current study score against target per subject
    Progress {
        /// Only this subject
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Individual assessment scores for one subject
    Breakdown {
        subject: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct SubjectProgress {
    subject: String,
    current: Option<f64>,
    target: f64,
    progress: Option<analytics::Progress>,
}

pub fn run(action: SubjectsAction, data_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (config, paths) = load_context(data_dir)?;
    let rows = store::load_study_scores(&paths.study_scores)?;

    match action {
        SubjectsAction::Averages { json } => {
            let averages = analytics::subject_averages(&rows);
            if json {
                println!("{}", serde_json::to_string_pretty(&averages)?);
            } else {
                for avg in &averages {
                    println!("{}: {}", avg.subject, avg.average);
                }
            }
        }
        SubjectsAction::Difficulty { write, json } => {
            let table = analytics::subject_difficulty(&rows, &config.planned_tests);
            if table.is_empty() {
                eprintln!("warning: no valid scores found to calculate difficulty");
                return Ok(());
            }
            if write {
                let file = std::fs::File::create(&paths.difficulty)?;
                analytics::write_difficulty_table(file, &table)?;
                eprintln!("difficulty saved to {}", paths.difficulty.display());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                for row in &table {
                    println!(
                        "{}: difficulty {} (mean {}, {}/{} tests)",
                        row.subject, row.difficulty, row.mean_score, row.tests_taken, row.planned_tests
                    );
                }
            }
        }
        SubjectsAction::Progress { subject, json } => {
            let current = store::current_scores(&rows);
            let targets = store::load_target_scores(&paths.target_scores)?;

            let mut subjects: Vec<String> = current.keys().chain(targets.keys()).cloned().collect();
            subjects.sort();
            subjects.dedup();
            if let Some(only) = subject {
                subjects.retain(|s| *s == only);
            }

            let report: Vec<SubjectProgress> = subjects
                .into_iter()
                .map(|s| {
                    let cur = current.get(&s).copied();
                    let target = targets
                        .get(&s)
                        .copied()
                        .unwrap_or(sacrank_core::model::MAX_STUDY_SCORE);
                    SubjectProgress {
                        progress: cur.map(|c| analytics::progress(c, target)),
                        subject: s,
                        current: cur,
                        target,
                    }
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for p in &report {
                    match &p.progress {
                        Some(progress) => println!("{}: {}", p.subject, progress),
                        None => println!("{}: No data available", p.subject),
                    }
                }
            }
        }
        SubjectsAction::Breakdown { subject, json } => {
            let sacs = analytics::sac_breakdown(&rows, &subject);
            if json {
                println!("{}", serde_json::to_string_pretty(&sacs)?);
            } else if sacs.is_empty() {
                println!("No SAC scores recorded for {subject}");
            } else {
                for row in sacs {
                    let score = row.score.map(|s| format!("{s:.1}")).unwrap_or_default();
                    let pct = row.percentage.as_deref().unwrap_or("N/A");
                    println!("{}: {} ({})", row.sac, score, pct);
                }
            }
        }
    }
    Ok(())
}
