use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::streak::ComebackLevel;

/// Every streak-relevant state change produces an Event.
/// The notification planner turns them into nudges; nothing flows back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CheckinRecorded {
        habit_id: String,
        date: NaiveDate,
        completed: bool,
        current_streak: u32,
        at: DateTime<Utc>,
    },
    /// The current streak just reached one of the configured milestone lengths.
    StreakMilestone {
        habit_id: String,
        streak: u32,
        at: DateTime<Utc>,
    },
    /// A positive streak dropped to zero.
    StreakBroken {
        habit_id: String,
        previous_streak: u32,
        at: DateTime<Utc>,
    },
    /// A completed check-in after a moderate or major lapse.
    ComebackMade {
        habit_id: String,
        days_away: u32,
        level: ComebackLevel,
        at: DateTime<Utc>,
    },
    InsuranceUsed {
        habit_id: String,
        date: NaiveDate,
        insurance_remaining: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn habit_id(&self) -> &str {
        match self {
            Event::CheckinRecorded { habit_id, .. }
            | Event::StreakMilestone { habit_id, .. }
            | Event::StreakBroken { habit_id, .. }
            | Event::ComebackMade { habit_id, .. }
            | Event::InsuranceUsed { habit_id, .. } => habit_id,
        }
    }
}
