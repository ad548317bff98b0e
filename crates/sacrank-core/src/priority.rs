//! Priority combination and ranking.
//!
//! Combines a record's difficulty and urgency into a single [`Priority`] and
//! orders a batch of records by it, highest first. Two combination rules are
//! available as a [`Strategy`]:
//!
//! - **Ratio**: `difficulty / max(days_until, epsilon)` on the weight scale
//!   (levels 1/2/3, continuous difficulty times 3); anything due now or
//!   earlier is [`Priority::Maximum`].
//! - **Complement**: `1 - (1 - difficulty) * (1 - urgency)` on the unit
//!   scale, high when either signal is high.
//!
//! Records with invalid difficulty inputs do not abort the pass. They get
//! [`RankingConfig::default_priority`] and are reported as [`RankWarning`]s.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ConfigError, ValidationError};
use crate::model::{self, DifficultyScale, DEFAULT_DECAY_K};
use crate::record::ExamRecord;

/// Default guard against dividing by a zero day count.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Priority given to a record whose inputs could not be scored.
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// Per-extra-record boost for subjects with several scheduled items.
pub const SUBJECT_BOOST_STEP: f64 = 0.1;

/// Rule used to merge difficulty and urgency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Ratio,
    #[default]
    Complement,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Ratio => "ratio",
            Strategy::Complement => "complement",
        }
    }

    fn scale(self) -> DifficultyScale {
        match self {
            Strategy::Ratio => DifficultyScale::Weight,
            Strategy::Complement => DifficultyScale::Unit,
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ratio" => Ok(Strategy::Ratio),
            "complement" => Ok(Strategy::Complement),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed priority. `Maximum` sorts above every finite score.
#[derive(Debug, Clone, Copy)]
pub enum Priority {
    Maximum,
    Score(f64),
}

impl Priority {
    /// Wrap a raw value, mapping anything non-finite to `Maximum`.
    fn from_raw(value: f64) -> Self {
        if value.is_finite() {
            Priority::Score(value)
        } else {
            Priority::Maximum
        }
    }

    pub fn is_maximum(self) -> bool {
        matches!(self, Priority::Maximum)
    }

    /// Finite score, or `None` for the sentinel.
    pub fn score(self) -> Option<f64> {
        match self {
            Priority::Maximum => None,
            Priority::Score(v) => Some(v),
        }
    }

    fn scaled(self, factor: f64) -> Self {
        match self {
            Priority::Maximum => Priority::Maximum,
            Priority::Score(v) => Priority::from_raw(v * factor),
        }
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Priority::Maximum, Priority::Maximum) => Ordering::Equal,
            (Priority::Maximum, Priority::Score(_)) => Ordering::Greater,
            (Priority::Score(_), Priority::Maximum) => Ordering::Less,
            (Priority::Score(a), Priority::Score(b)) => a.total_cmp(b),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Maximum => f.write_str("MAX"),
            Priority::Score(v) => write!(f, "{v:.3}"),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Priority::Maximum => serializer.serialize_str("max"),
            Priority::Score(v) => serializer.serialize_f64(*v),
        }
    }
}

/// Display bucket for how close a record is to its due date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyBand {
    /// Due now or in the past
    Overdue,
    /// Up to 3 whole days left
    Urgent,
    /// Up to 7 whole days left
    Soon,
    /// More than a week away
    Later,
}

impl UrgencyBand {
    pub fn from_days(days_until: f64) -> Self {
        if days_until <= 0.0 {
            return UrgencyBand::Overdue;
        }
        let whole_days = days_until.floor();
        if whole_days <= 3.0 {
            UrgencyBand::Urgent
        } else if whole_days <= 7.0 {
            UrgencyBand::Soon
        } else {
            UrgencyBand::Later
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UrgencyBand::Overdue => "OVERDUE",
            UrgencyBand::Urgent => "URGENT",
            UrgencyBand::Soon => "SOON",
            UrgencyBand::Later => "LATER",
        }
    }
}

/// Ranking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Combination rule
    #[serde(default)]
    pub strategy: Strategy,
    /// Urgency decay rate `k` (must be > 0)
    #[serde(default = "default_decay_k")]
    pub decay_k: f64,
    /// Scale priorities of subjects with several scheduled records
    #[serde(default)]
    pub subject_boost_enabled: bool,
    /// Floor for the ratio strategy's day count (must be > 0)
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Priority substituted for records that fail validation
    #[serde(default = "default_priority")]
    pub default_priority: f64,
}

fn default_decay_k() -> f64 {
    DEFAULT_DECAY_K
}
fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}
fn default_priority() -> f64 {
    DEFAULT_PRIORITY
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            decay_k: DEFAULT_DECAY_K,
            subject_boost_enabled: false,
            epsilon: DEFAULT_EPSILON,
            default_priority: DEFAULT_PRIORITY,
        }
    }
}

impl RankingConfig {
    /// Check that every numeric option is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.decay_k.is_finite() && self.decay_k > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "decay_k".into(),
                message: format!("must be a finite number greater than 0, got {}", self.decay_k),
            });
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "epsilon".into(),
                message: format!("must be a finite number greater than 0, got {}", self.epsilon),
            });
        }
        if !self.default_priority.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "default_priority".into(),
                message: format!("must be finite, got {}", self.default_priority),
            });
        }
        Ok(())
    }
}

/// A record with its computed priority and the signals behind it.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub record: ExamRecord,
    pub priority: Priority,
    /// Fractional days until due (negative when overdue)
    pub days_until: f64,
    /// Urgency signal on (0, 1]
    pub urgency: f64,
    /// Difficulty used by the strategy; `None` when the record was defaulted
    pub difficulty: Option<f64>,
    pub band: UrgencyBand,
}

impl RankedEntry {
    pub fn is_defaulted(&self) -> bool {
        self.difficulty.is_none()
    }
}

/// A record that was given the default priority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankWarning {
    /// Position of the record in the input sequence
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Output of a ranking pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RankedList {
    pub entries: Vec<RankedEntry>,
    pub warnings: Vec<RankWarning>,
}

impl RankedList {
    pub fn into_records(self) -> Vec<ExamRecord> {
        self.entries.into_iter().map(|e| e.record).collect()
    }
}

/// Ratio rule. Non-positive day counts yield [`Priority::Maximum`].
pub fn combine_ratio(difficulty: f64, days_until: f64, epsilon: f64) -> Priority {
    if days_until <= 0.0 {
        return Priority::Maximum;
    }
    Priority::from_raw(difficulty / days_until.max(epsilon))
}

/// Complement rule. Inputs are clamped to [0, 1].
pub fn combine_complement(difficulty: f64, urgency: f64) -> f64 {
    let d = difficulty.clamp(0.0, 1.0);
    let u = urgency.clamp(0.0, 1.0);
    1.0 - ((1.0 - d) * (1.0 - u))
}

/// Multiplier for a subject with `count` records in the batch.
pub fn subject_boost(count: usize) -> f64 {
    1.0 + count.saturating_sub(1) as f64 * SUBJECT_BOOST_STEP
}

/// Ranks batches of records under a fixed configuration.
#[derive(Debug, Clone)]
pub struct Ranker {
    config: RankingConfig,
}

impl Ranker {
    /// Create a ranker, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unusable decay rate,
    /// epsilon or default priority.
    pub fn new(config: RankingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Compute a single record's entry, without the subject boost.
    ///
    /// # Errors
    ///
    /// Returns the record's [`ValidationError`] if its difficulty inputs
    /// cannot be resolved.
    pub fn score(
        &self,
        record: &ExamRecord,
        now: NaiveDateTime,
    ) -> Result<RankedEntry, ValidationError> {
        let days_until = model::days_until(record.due, now);
        let urgency = model::urgency(days_until, self.config.decay_k);
        let difficulty = model::resolve_difficulty(&record.difficulty, self.config.strategy.scale())?;

        let priority = match self.config.strategy {
            Strategy::Ratio => combine_ratio(difficulty, days_until, self.config.epsilon),
            Strategy::Complement => Priority::from_raw(combine_complement(difficulty, urgency)),
        };

        Ok(RankedEntry {
            record: record.clone(),
            priority,
            days_until,
            urgency,
            difficulty: Some(difficulty),
            band: UrgencyBand::from_days(days_until),
        })
    }

    /// Score every record and sort highest priority first.
    ///
    /// Ties keep their input order. Records that fail validation receive the
    /// default priority and are listed in [`RankedList::warnings`].
    pub fn rank(&self, records: Vec<ExamRecord>, now: NaiveDateTime) -> RankedList {
        let subject_counts = if self.config.subject_boost_enabled {
            count_subjects(&records)
        } else {
            HashMap::new()
        };

        let mut warnings = Vec::new();
        let mut entries: Vec<RankedEntry> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| match self.score(&record, now) {
                Ok(mut entry) => {
                    if let Some(count) = subject_counts.get(record.subject.as_str()) {
                        entry.priority = entry.priority.scaled(subject_boost(*count));
                    }
                    entry
                }
                Err(err) => {
                    tracing::warn!(
                        index,
                        name = %record.name,
                        error = %err,
                        "record defaulted to priority {}",
                        self.config.default_priority
                    );
                    warnings.push(RankWarning {
                        index,
                        name: record.name.clone(),
                        reason: err.to_string(),
                    });
                    self.defaulted_entry(record, now)
                }
            })
            .collect();

        // slice::sort_by is stable, so equal priorities keep input order.
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));

        tracing::debug!(
            strategy = %self.config.strategy,
            records = entries.len(),
            defaulted = warnings.len(),
            "ranking pass complete"
        );

        RankedList { entries, warnings }
    }

    fn defaulted_entry(&self, record: ExamRecord, now: NaiveDateTime) -> RankedEntry {
        let days_until = model::days_until(record.due, now);
        RankedEntry {
            priority: Priority::Score(self.config.default_priority),
            urgency: model::urgency(days_until, self.config.decay_k),
            difficulty: None,
            band: UrgencyBand::from_days(days_until),
            days_until,
            record,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self {
            config: RankingConfig::default(),
        }
    }
}

fn count_subjects(records: &[ExamRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.subject.clone()).or_insert(0) += 1;
    }
    counts
}

/// Convenience function to rank a batch with a given configuration.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the configuration is invalid; no partial
/// result is produced.
pub fn rank(
    records: Vec<ExamRecord>,
    now: NaiveDateTime,
    config: &RankingConfig,
) -> Result<RankedList, ConfigError> {
    Ok(Ranker::new(config.clone())?.rank(records, now))
}
