//! Difficulty and urgency model.
//!
//! Pure functions producing the two per-record signals the priority
//! combiner works with:
//!
//! ```text
//! urgency(d, k) = min(1, exp(-k * d))
//!
//! target_percent    = (T / 50) * 100
//! sac_score_percent = S * 2
//! relative_perf     = max(0, 1 - sac_score_percent / target_percent)
//! difficulty        = 1 - (1 - relative_perf) * (1 - w)
//! ```
//!
//! `d` is fractional days until the due date, `S`/`T` are current and target
//! study scores on the 0-50 scale and `w` is the mark-weight ratio.

use chrono::NaiveDateTime;

use crate::error::ValidationError;
use crate::record::DifficultyInput;

/// Default urgency decay rate.
pub const DEFAULT_DECAY_K: f64 = 0.4;

/// Slower decay rate used by the batch percentage calculator.
pub const SLOW_DECAY_K: f64 = 0.16;

/// Upper bound of the study score scale.
pub const MAX_STUDY_SCORE: f64 = 50.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Fractional days from `now` until `due`. Negative when overdue.
pub fn days_until(due: NaiveDateTime, now: NaiveDateTime) -> f64 {
    due.signed_duration_since(now).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Exponential urgency decay, capped at 1 for overdue items.
pub fn urgency(days_until: f64, k: f64) -> f64 {
    (-k * days_until).exp().min(1.0)
}

/// Scale a difficulty value is expressed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyScale {
    /// Weights on [0, 3]: levels as 1/2/3, continuous values multiplied by 3.
    Weight,
    /// Everything on [0, 1]; categorical levels divided by 3.
    Unit,
}

/// Largest categorical weight; maps the unit scale onto the weight scale.
const MAX_WEIGHT: f64 = 3.0;

impl DifficultyScale {
    fn map_unit(self, value: f64) -> f64 {
        match self {
            DifficultyScale::Weight => value * MAX_WEIGHT,
            DifficultyScale::Unit => value,
        }
    }
}

/// Performance-based difficulty.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidInput`] if any input is non-finite,
/// `target_score` is not in `(0, 50]`, `current_score` is not in `[0, 50]`
/// or `mark_weight` is not in `[0, 1]`.
pub fn performance_difficulty(
    current_score: f64,
    target_score: f64,
    mark_weight: f64,
) -> Result<f64, ValidationError> {
    require_finite("current_score", current_score)?;
    require_finite("target_score", target_score)?;
    require_finite("mark_weight", mark_weight)?;

    if target_score <= 0.0 {
        return Err(ValidationError::invalid(
            "target_score",
            format!("must be greater than 0, got {target_score}"),
        ));
    }
    if target_score > MAX_STUDY_SCORE {
        return Err(ValidationError::invalid(
            "target_score",
            format!("must be at most {MAX_STUDY_SCORE}, got {target_score}"),
        ));
    }
    if !(0.0..=MAX_STUDY_SCORE).contains(&current_score) {
        return Err(ValidationError::invalid(
            "current_score",
            format!("must be in [0, {MAX_STUDY_SCORE}], got {current_score}"),
        ));
    }
    if !(0.0..=1.0).contains(&mark_weight) {
        return Err(ValidationError::invalid(
            "mark_weight",
            format!("must be in [0, 1], got {mark_weight}"),
        ));
    }

    let target_percent = (target_score / MAX_STUDY_SCORE) * 100.0;
    let sac_score_percent = current_score * 2.0;
    let relative_perf = (1.0 - sac_score_percent / target_percent).max(0.0);
    let difficulty = 1.0 - ((1.0 - relative_perf) * (1.0 - mark_weight));

    Ok(difficulty.clamp(0.0, 1.0))
}

/// Resolve a record's difficulty input onto the requested scale.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidInput`] when performance inputs are
/// missing or out of range, or a scalar difficulty is not finite.
pub fn resolve_difficulty(
    input: &DifficultyInput,
    scale: DifficultyScale,
) -> Result<f64, ValidationError> {
    match input {
        DifficultyInput::Level(level) => Ok(match scale {
            DifficultyScale::Weight => level.weight(),
            DifficultyScale::Unit => level.unit(),
        }),
        DifficultyInput::Scalar(value) => {
            require_finite("difficulty", *value)?;
            Ok(scale.map_unit(value.clamp(0.0, 1.0)))
        }
        DifficultyInput::Performance {
            current_score,
            target_score,
            mark_weight,
        } => {
            let current = current_score
                .ok_or_else(|| ValidationError::invalid("current_score", "missing"))?;
            let target =
                target_score.ok_or_else(|| ValidationError::invalid("target_score", "missing"))?;
            let d = performance_difficulty(current, target, mark_weight.unwrap_or(1.0))?;
            Ok(scale.map_unit(d))
        }
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("must be a finite number, got {value}"),
        ))
    }
}
