pub mod config;
pub mod exams;
pub mod rank;
pub mod subjects;

use std::path::PathBuf;

use sacrank_core::{Config, DataPaths};

/// Load the config and resolve data paths, honouring `--data-dir`.
pub fn load_context(
    data_dir: Option<PathBuf>,
) -> Result<(Config, DataPaths), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let paths = config.data_paths(data_dir.as_deref())?;
    Ok((config, paths))
}

/// Parse a `--now` override or use local wall-clock time.
pub fn resolve_now(now: Option<&str>) -> Result<chrono::NaiveDateTime, String> {
    match now {
        Some(value) => sacrank_core::store::parse_due(value)
            .ok_or_else(|| format!("invalid --now value '{value}' (expected YYYY-MM-DD[ HH:MM])")),
        None => Ok(chrono::Local::now().naive_local()),
    }
}
