//! TOML-based application configuration.
//!
//! Stores:
//! - Ranking options (strategy, decay rate, subject boost, epsilon)
//! - Data file locations and the difficulty source used when loading exams
//! - Planned assessment counts per subject
//!
//! Configuration is stored at `~/.config/sacrank/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::priority::RankingConfig;
use crate::store::{DataPaths, DifficultySource};

/// Data file configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the CSV files; the config directory when unset.
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default = "default_exams")]
    pub exams: String,
    #[serde(default = "default_study_scores")]
    pub study_scores: String,
    #[serde(default = "default_target_scores")]
    pub target_scores: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub difficulty_source: DifficultySource,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/sacrank/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub data: DataConfig,
    /// Planned assessments per subject for score-derived difficulty.
    #[serde(default)]
    pub planned_tests: HashMap<String, u32>,
}

fn default_exams() -> String {
    "exams.csv".into()
}
fn default_study_scores() -> String {
    "study_scores.csv".into()
}
fn default_target_scores() -> String {
    "target_scores.csv".into()
}
fn default_difficulty() -> String {
    "difficulty.csv".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: None,
            exams: default_exams(),
            study_scores: default_study_scores(),
            target_scores: default_target_scores(),
            difficulty: default_difficulty(),
            difficulty_source: DifficultySource::default(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(key, format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(key, format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(key, format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(key, e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/sacrank"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, fails validation,
    /// or defaults cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.ranking.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting ranking options are invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        if key == "data.dir" {
            // `dir` serializes as null when unset, so it has no type to infer from.
            json["data"]["dir"] = serde_json::Value::String(value.into());
        } else {
            Self::set_json_value_by_path(&mut json, key, value)?;
        }
        let updated: Config =
            serde_json::from_value(json).map_err(|e| invalid(key, e.to_string()))?;
        updated.ranking.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Directory holding the data files, if one is set explicitly.
    ///
    /// `dir_override` (e.g. a command-line flag) wins over `data.dir`.
    fn explicit_data_dir(&self, dir_override: Option<&Path>) -> Option<PathBuf> {
        dir_override.map(Path::to_path_buf).or_else(|| {
            self.data
                .dir
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
        })
    }

    /// Resolve data file locations, falling back to `default_dir` when
    /// neither `dir_override` nor `data.dir` is set.
    pub fn data_paths_in(&self, dir_override: Option<&Path>, default_dir: &Path) -> DataPaths {
        let base = self
            .explicit_data_dir(dir_override)
            .unwrap_or_else(|| default_dir.to_path_buf());
        DataPaths {
            exams: base.join(&self.data.exams),
            study_scores: base.join(&self.data.study_scores),
            target_scores: base.join(&self.data.target_scores),
            difficulty: base.join(&self.data.difficulty),
        }
    }

    /// Resolve data file locations, falling back to the config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory is needed and cannot be
    /// created.
    pub fn data_paths(&self, dir_override: Option<&Path>) -> Result<DataPaths, ConfigError> {
        let default_dir = match self.explicit_data_dir(dir_override) {
            Some(dir) => dir,
            None => data_dir().map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/sacrank"),
                message: e.to_string(),
            })?,
        };
        Ok(self.data_paths_in(dir_override, &default_dir))
    }
}
