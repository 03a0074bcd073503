//! Comeback classification and canned motivational copy.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::habit::Checkin;

/// Trailing window, in days, searched for the last completed check-in.
pub const COMEBACK_WINDOW_DAYS: u64 = 7;

/// How long the user has been away, as an emotional framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComebackLevel {
    #[default]
    None,
    Minor,
    Moderate,
    Major,
}

impl ComebackLevel {
    /// Level for the number of days since the last completed check-in.
    pub fn from_days(days_since_last: u32) -> Self {
        match days_since_last {
            0..=1 => ComebackLevel::None,
            2 => ComebackLevel::Minor,
            3..=6 => ComebackLevel::Moderate,
            _ => ComebackLevel::Major,
        }
    }

    pub fn message(&self, days_since_last: u32) -> Option<String> {
        match self {
            ComebackLevel::None => None,
            ComebackLevel::Minor => {
                Some("Don't let yesterday define today! Let's bounce back!".to_string())
            }
            ComebackLevel::Moderate => Some(format!(
                "Time for a comeback! Let's get back on track after {days_since_last} days."
            )),
            ComebackLevel::Major => Some(format!(
                "Welcome back, hero! It's been {days_since_last} days. Ready to restart your quest?"
            )),
        }
    }
}

/// Re-engagement state of a habit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComebackStatus {
    pub is_comeback: bool,
    pub days_since_last: u32,
    pub message: Option<String>,
    pub level: ComebackLevel,
}

impl ComebackStatus {
    /// Classify from the last completed check-in in `[today - 7, today]`.
    ///
    /// With no completed check-in in that window there is nothing to assess,
    /// so the result is "no comeback" rather than `Major`.
    pub fn assess(checkins: &[Checkin], today: NaiveDate) -> Self {
        let window_start = today
            .checked_sub_days(Days::new(COMEBACK_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN);

        let last_success = checkins
            .iter()
            .filter(|c| c.completed && c.date >= window_start && c.date <= today)
            .map(|c| c.date)
            .max();

        let Some(last) = last_success else {
            return Self::default();
        };

        let days_since_last = (today - last).num_days().max(0) as u32;
        let level = ComebackLevel::from_days(days_since_last);

        Self {
            is_comeback: level != ComebackLevel::None,
            days_since_last,
            message: level.message(days_since_last),
            level,
        }
    }
}

/// Tiered message for a streak length.
pub fn streak_message(streak: u32) -> String {
    match streak {
        0 => "🌟 Every expert was once a beginner. Your journey starts now!".to_string(),
        1 => "🎉 Great start! One day down, many more to go!".to_string(),
        s if s < 7 => format!("🚀 {s} days strong! You're building momentum!"),
        s if s < 21 => format!("🔥 {s} day streak! You're on fire!"),
        s if s < 30 => format!("🏆 {s} days! You're becoming unstoppable!"),
        s => format!("👑 {s} day streak! You're a true habit master!"),
    }
}
