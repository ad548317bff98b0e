//! Exam and assessment records handed to the ranking pass.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Categorical difficulty label attached to an exam.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DifficultyLevel {
    Low,
    Medium,
    High,
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        DifficultyLevel::Low
    }
}

impl DifficultyLevel {
    /// Parse a label, case-insensitively. Unknown labels map to `Low`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "medium" => DifficultyLevel::Medium,
            "high" => DifficultyLevel::High,
            _ => DifficultyLevel::Low,
        }
    }

    /// Whether `label` names one of the three levels.
    pub fn is_label(label: &str) -> bool {
        matches!(
            label.trim().to_ascii_lowercase().as_str(),
            "low" | "medium" | "high"
        )
    }

    /// Categorical weight: Low=1, Medium=2, High=3.
    pub fn weight(self) -> f64 {
        match self {
            DifficultyLevel::Low => 1.0,
            DifficultyLevel::Medium => 2.0,
            DifficultyLevel::High => 3.0,
        }
    }

    /// Weight normalised onto [0, 1] (weight / 3).
    pub fn unit(self) -> f64 {
        self.weight() / 3.0
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Low => "Low",
            DifficultyLevel::Medium => "Medium",
            DifficultyLevel::High => "High",
        }
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The difficulty information a record carries.
///
/// Which variant is present decides which difficulty definition the model
/// applies to the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyInput {
    /// Categorical label (Low/Medium/High).
    Level(DifficultyLevel),
    /// Continuous difficulty already on [0, 1].
    Scalar(f64),
    /// Performance-based inputs on the 0-50 study score scale.
    Performance {
        current_score: Option<f64>,
        target_score: Option<f64>,
        /// `sac_marks / max_possible_marks`; 1.0 when absent.
        mark_weight: Option<f64>,
    },
}

impl Default for DifficultyInput {
    fn default() -> Self {
        DifficultyInput::Level(DifficultyLevel::default())
    }
}

/// A single exam or school-assessed coursework item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    /// Display name, e.g. "Bio SAC"
    pub name: String,
    /// Due date-time; date-only sources use midnight
    pub due: NaiveDateTime,
    /// Subject label used for grouping and the multiplicity boost
    pub subject: String,
    /// Difficulty inputs
    pub difficulty: DifficultyInput,
}

impl ExamRecord {
    /// Create a record with the default (Low) categorical difficulty.
    pub fn new(name: impl Into<String>, due: NaiveDateTime, subject: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            due,
            subject: subject.into(),
            difficulty: DifficultyInput::default(),
        }
    }

    pub fn with_level(mut self, level: DifficultyLevel) -> Self {
        self.difficulty = DifficultyInput::Level(level);
        self
    }

    pub fn with_scalar(mut self, difficulty: f64) -> Self {
        self.difficulty = DifficultyInput::Scalar(difficulty);
        self
    }

    pub fn with_scores(
        mut self,
        current_score: Option<f64>,
        target_score: Option<f64>,
        mark_weight: Option<f64>,
    ) -> Self {
        self.difficulty = DifficultyInput::Performance {
            current_score,
            target_score,
            mark_weight,
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping_is_fixed() {
        assert_eq!(DifficultyLevel::Low.weight(), 1.0);
        assert_eq!(DifficultyLevel::Medium.weight(), 2.0);
        assert_eq!(DifficultyLevel::High.weight(), 3.0);
    }

    #[test]
    fn unknown_labels_default_to_low() {
        assert_eq!(DifficultyLevel::from_label("HIGH"), DifficultyLevel::High);
        assert_eq!(DifficultyLevel::from_label(" medium "), DifficultyLevel::Medium);
        assert_eq!(DifficultyLevel::from_label("extreme"), DifficultyLevel::Low);
        assert_eq!(DifficultyLevel::from_label(""), DifficultyLevel::Low);
        assert!(!DifficultyLevel::is_label("extreme"));
        assert!(DifficultyLevel::is_label("Low"));
    }

    #[test]
    fn unit_scale_tops_out_at_high() {
        assert_eq!(DifficultyLevel::High.unit(), 1.0);
        assert!(DifficultyLevel::Low.unit() < DifficultyLevel::Medium.unit());
    }
}
