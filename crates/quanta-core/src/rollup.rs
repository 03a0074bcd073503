//! Per-user aggregation of habit streaks.
//!
//! A [`UserProgress`] is what reporting and notification code read: one
//! [`HabitSummary`] per active habit plus totals across them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::habit::{Cadence, Difficulty, Habit};
use crate::streak::{completion_rate, ComebackLevel, StreakSnapshot, StreakStats};

/// One habit's standing at `today`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub title: String,
    pub cadence: Cadence,
    pub difficulty: Difficulty,
    pub stats: StreakStats,
    pub comeback_level: ComebackLevel,
    pub motivational_message: String,
    /// Date of the newest check-in of any kind
    pub last_checkin_on: Option<NaiveDate>,
}

impl HabitSummary {
    pub fn new(habit: &Habit, snapshot: StreakSnapshot, last_checkin_on: Option<NaiveDate>) -> Self {
        Self {
            habit_id: habit.id.clone(),
            title: habit.title.clone(),
            cadence: habit.cadence,
            difficulty: habit.difficulty,
            stats: snapshot.stats,
            comeback_level: snapshot.comeback.level,
            motivational_message: snapshot.motivational_message,
            last_checkin_on,
        }
    }
}

/// Totals across a user's active habits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub display_name: String,
    pub today: NaiveDate,
    pub habit_count: u32,
    /// Habits whose current streak is positive
    pub active_streaks: u32,
    pub best_current_streak: u32,
    pub best_longest_streak: u32,
    pub total_completions: u32,
    pub total_checkins: u32,
    pub overall_completion_rate: f64,
    pub insurance_available: u32,
    pub last_checkin_on: Option<NaiveDate>,
    pub habits: Vec<HabitSummary>,
}

impl UserProgress {
    pub fn build(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        today: NaiveDate,
        habits: Vec<HabitSummary>,
    ) -> Self {
        let mut progress = Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            today,
            habit_count: habits.len() as u32,
            active_streaks: 0,
            best_current_streak: 0,
            best_longest_streak: 0,
            total_completions: 0,
            total_checkins: 0,
            overall_completion_rate: 0.0,
            insurance_available: 0,
            last_checkin_on: None,
            habits: Vec::new(),
        };

        for habit in &habits {
            let stats = &habit.stats;
            if stats.current_streak > 0 {
                progress.active_streaks += 1;
            }
            progress.best_current_streak = progress.best_current_streak.max(stats.current_streak);
            progress.best_longest_streak = progress.best_longest_streak.max(stats.longest_streak);
            progress.total_completions += stats.total_completions;
            progress.total_checkins += stats.total_checkins;
            progress.insurance_available += stats.insurance_available;
            progress.last_checkin_on = progress.last_checkin_on.max(habit.last_checkin_on);
        }

        progress.overall_completion_rate =
            completion_rate(progress.total_completions, progress.total_checkins);
        progress.habits = habits;
        progress
    }

    /// The habit with the longest current streak, ties broken by list order.
    pub fn top_habit(&self) -> Option<&HabitSummary> {
        self.habits
            .iter()
            .rev()
            .max_by_key(|h| h.stats.current_streak)
    }

    /// Whole days since the newest check-in across all habits.
    pub fn days_inactive(&self) -> Option<u32> {
        self.last_checkin_on
            .map(|last| (self.today - last).num_days().max(0) as u32)
    }
}
