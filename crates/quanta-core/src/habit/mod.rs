//! Habit and check-in records.
//!
//! These are the persisted entities the streak engine reads. Input types
//! (`NewHabit`, `NewCheckin`) are validated here, at the boundary, so the
//! engine itself can assume well-formed data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const TITLE_MAX_LEN: usize = 255;

/// Calendar date format used on the wire and in storage.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// How often a habit is expected to be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    #[default]
    Daily,
    Weekly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Cadence::Daily),
            "weekly" => Some(Cadence::Weekly),
            _ => None,
        }
    }
}

/// Difficulty level, 1 (easy) to 3 (hard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const EASY: Difficulty = Difficulty(1);
    pub const MEDIUM: Difficulty = Difficulty(2);
    pub const HARD: Difficulty = Difficulty(3);

    pub fn new(level: i64) -> Result<Self, ValidationError> {
        match level {
            1..=3 => Ok(Difficulty(level as u8)),
            _ => Err(ValidationError::InvalidDifficulty(level)),
        }
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Easy",
            2 => "Medium",
            _ => "Hard",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::EASY
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Difficulty::new(value)
    }
}

impl From<Difficulty> for i64 {
    fn from(d: Difficulty) -> Self {
        d.0 as i64
    }
}

/// Where a check-in originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Web,
    Telegram,
    Whatsapp,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Web => "web",
            Channel::Telegram => "telegram",
            Channel::Whatsapp => "whatsapp",
            Channel::Email => "email",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "web" => Some(Channel::Web),
            "telegram" => Some(Channel::Telegram),
            "whatsapp" => Some(Channel::Whatsapp),
            "email" => Some(Channel::Email),
            _ => None,
        }
    }
}

/// A habit definition owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub cadence: Cadence,
    pub difficulty: Difficulty,
    /// When/where the habit is performed
    pub anchor: String,
    /// Smallest version of the habit
    pub micro_habit: String,
    pub is_active: bool,
    /// Display order within the user's list
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a habit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHabit {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub cadence: Cadence,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub anchor: String,
    #[serde(default)]
    pub micro_habit: String,
    #[serde(default)]
    pub order: i64,
}

impl NewHabit {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Reject input the engine must never see.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("user_id"));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.title.chars().count() > TITLE_MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: TITLE_MAX_LEN,
            });
        }
        Ok(())
    }
}

/// One day's record for a habit.
///
/// `used_insurance` means the day counts toward the streak even though it
/// was not completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkin {
    pub id: String,
    pub habit_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    pub used_insurance: bool,
    pub note: Option<String>,
    pub channel: Channel,
    pub created_at: DateTime<Utc>,
}

impl Checkin {
    /// Completed or covered by insurance.
    pub fn is_success(&self) -> bool {
        self.completed || self.used_insurance
    }

    /// Neither completed nor insured.
    pub fn is_plain_miss(&self) -> bool {
        !self.is_success()
    }
}

/// Input for recording a check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCheckin {
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default)]
    pub used_insurance: bool,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub channel: Channel,
}

impl NewCheckin {
    pub fn completed(date: NaiveDate) -> Self {
        Self {
            date,
            completed: true,
            used_insurance: false,
            note: None,
            channel: Channel::Web,
        }
    }

    pub fn missed(date: NaiveDate) -> Self {
        Self {
            completed: false,
            ..Self::completed(date)
        }
    }

    /// The synthesized row written when a grace day covers `date`.
    pub fn insured(date: NaiveDate) -> Self {
        Self {
            completed: false,
            used_insurance: true,
            ..Self::completed(date)
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn via(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Blank notes are stored as absent.
    pub fn normalized(mut self) -> Self {
        if self.note.as_deref().is_some_and(|n| n.trim().is_empty()) {
            self.note = None;
        }
        self
    }
}
