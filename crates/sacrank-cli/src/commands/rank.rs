//! Ranked exam list.

use clap::Args;
use sacrank_core::store::{self, format_due};
use sacrank_core::{DifficultySource, RankedList, Ranker, SkippedRow, Strategy};
use serde::Serialize;
use std::path::PathBuf;

use super::{load_context, resolve_now};

#[derive(Args)]
pub struct RankArgs {
    /// Exams file (defaults to the configured data file)
    #[arg(long)]
    exams: Option<PathBuf>,
    /// Combination strategy: ratio or complement
    #[arg(long)]
    strategy: Option<String>,
    /// Urgency decay rate
    #[arg(long)]
    decay_k: Option<f64>,
    /// Boost subjects with several scheduled exams
    #[arg(long)]
    subject_boost: bool,
    /// Day-count floor for the ratio strategy
    #[arg(long)]
    epsilon: Option<f64>,
    /// Difficulty source: exams, performance or subject
    #[arg(long)]
    difficulty: Option<DifficultySource>,
    /// Rank as of this time instead of now (YYYY-MM-DD[ HH:MM])
    #[arg(long)]
    now: Option<String>,
    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RankOutput<'a> {
    strategy: Strategy,
    #[serde(flatten)]
    ranked: &'a RankedList,
    skipped: &'a [SkippedRow],
}

pub fn run(args: RankArgs, data_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (config, mut paths) = load_context(data_dir)?;
    if let Some(exams) = args.exams {
        paths.exams = exams;
    }

    let mut ranking = config.ranking.clone();
    if let Some(name) = args.strategy.as_deref() {
        ranking.strategy = name.parse::<Strategy>()?;
    }
    if let Some(k) = args.decay_k {
        ranking.decay_k = k;
    }
    if let Some(eps) = args.epsilon {
        ranking.epsilon = eps;
    }
    if args.subject_boost {
        ranking.subject_boost_enabled = true;
    }
    let ranker = Ranker::new(ranking)?;
    let now = resolve_now(args.now.as_deref())?;
    let source = args.difficulty.unwrap_or(config.data.difficulty_source);
    tracing::debug!(exams = %paths.exams.display(), %now, ?source, "ranking");

    let loaded = store::load_exams_with_source(&paths, source)?;
    let ranked = ranker.rank(loaded.records, now);

    if args.json {
        let output = RankOutput {
            strategy: ranker.config().strategy,
            ranked: &ranked,
            skipped: &loaded.skipped,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_table(&ranked);
    }

    for row in &loaded.skipped {
        eprintln!("warning: skipped line {} of {}: {}", row.line, paths.exams.display(), row.reason);
    }
    for warning in &ranked.warnings {
        eprintln!(
            "warning: '{}' (record {}) given default priority: {}",
            warning.name, warning.index, warning.reason
        );
    }
    Ok(())
}

fn print_table(ranked: &RankedList) {
    if ranked.entries.is_empty() {
        println!("No exams scheduled.");
        return;
    }
    for (i, entry) in ranked.entries.iter().enumerate() {
        let days = if entry.days_until > 0.0 {
            format!("{} days left", entry.days_until.floor() as i64)
        } else {
            "OVERDUE".to_string()
        };
        println!(
            "{:>3}. {:<8} {:>7}  {} ({}) due {}, {}",
            i + 1,
            entry.band.label(),
            entry.priority.to_string(),
            entry.record.name,
            entry.record.subject,
            format_due(entry.record.due),
            days
        );
    }
}
