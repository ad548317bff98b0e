//! # sacrank Core Library
//!
//! This library ranks a student's upcoming exams and school-assessed
//! coursework by how urgently they need attention. It follows a CLI-first
//! layout: all behaviour lives here and the `sacrank` binary is a thin
//! presenter over it.
//!
//! ## Architecture
//!
//! - **Model**: pure difficulty and urgency functions
//! - **Priority**: combination strategies and the stable ranking pass
//! - **Store**: CSV loaders for exams, study scores, targets and difficulty
//! - **Analytics**: per-subject averages, difficulty and progress
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Ranker`]: ranks a batch of [`ExamRecord`]s under a [`RankingConfig`]
//! - [`Config`]: application configuration management

pub mod analytics;
pub mod error;
pub mod model;
pub mod priority;
pub mod record;
pub mod storage;
pub mod store;

pub use error::{ConfigError, StoreError, ValidationError};
pub use priority::{
    rank, Priority, RankWarning, RankedEntry, RankedList, Ranker, RankingConfig, Strategy,
    UrgencyBand,
};
pub use record::{DifficultyInput, DifficultyLevel, ExamRecord};
pub use storage::Config;
pub use store::{DataPaths, DifficultySource, LoadedExams, SkippedRow};
