//! # Quanta Core Library
//!
//! This library provides the core business logic for Quanta, a habit tracker
//! built around daily check-ins, streaks and grace days ("insurance"). All
//! operations are available through the standalone `quanta-cli` binary, which
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Streak Engine**: Pure functions over a habit's check-in history. The
//!   reference date `today` is always passed in; the engine never reads the
//!   clock
//! - **Storage**: SQLite-based habit and check-in storage and TOML-based
//!   configuration
//! - **Tracker**: Writes check-ins and spends insurance atomically, emitting
//!   domain events
//! - **Rollup / Notify / Narrative**: Read-only consumers that aggregate per
//!   user, plan nudges, and write progress reports
//!
//! ## Key Components
//!
//! - [`StreakEngine`]: Streak, insurance and comeback computation
//! - [`HabitTracker`]: Check-in and insurance operations over a repository
//! - [`Database`]: Habit and check-in persistence
//! - [`Config`]: Application configuration management
//! - [`NarrativeService`]: Trait for progress report backends

pub mod error;
pub mod events;
pub mod habit;
pub mod narrative;
pub mod notify;
pub mod rollup;
pub mod storage;
pub mod streak;
pub mod tracker;

pub use error::{ConfigError, CoreError, DatabaseError, NarrativeError, ValidationError};
pub use events::Event;
pub use habit::{Cadence, Channel, Checkin, Difficulty, Habit, NewCheckin, NewHabit};
pub use narrative::{FallbackNarrator, HttpNarrativeService, NarrativeService, Narrator, ProgressNarrative};
pub use notify::{Badge, NotificationPlanner, Nudge, NudgeKind};
pub use rollup::{HabitSummary, UserProgress};
pub use storage::{CheckinRepository, Config, Database};
pub use streak::{
    ComebackLevel, ComebackStatus, MissingToday, StreakEngine, StreakSnapshot, StreakStats,
};
pub use tracker::{CheckinReceipt, HabitTracker, InsuranceOutcome, InsuranceStatus};
