//! Habit tracker service.
//!
//! Couples a [`CheckinRepository`] with the [`StreakEngine`]. The engine is
//! pure; this is where check-ins get written and where the streak before and
//! after a write is compared to produce [`Event`]s.
//!
//! Both writing operations run inside [`CheckinRepository::atomically`], so
//! the history they read is the history they write against.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::habit::{Checkin, NewCheckin};
use crate::rollup::{HabitSummary, UserProgress};
use crate::storage::CheckinRepository;
use crate::streak::{ComebackLevel, StreakEngine, StreakSnapshot};

/// Streak lengths announced as milestones unless configured otherwise.
pub const DEFAULT_MILESTONES: [u32; 6] = [7, 14, 21, 30, 60, 100];

/// A stored check-in and what it changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinReceipt {
    pub checkin: Checkin,
    pub current_streak: u32,
    pub events: Vec<Event>,
}

/// How a grace-day request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceStatus {
    /// No row existed; an insured row was written.
    Created,
    /// An existing row was flagged.
    Flagged,
    /// The date was already insured; nothing changed.
    AlreadyInsured,
    /// Balance was zero; nothing changed.
    NoBalance,
    /// The date is older than the current streak; nothing changed.
    OutOfWindow,
}

impl InsuranceStatus {
    pub fn applied(&self) -> bool {
        !matches!(self, InsuranceStatus::NoBalance | InsuranceStatus::OutOfWindow)
    }

    pub fn message(&self) -> &'static str {
        match self {
            InsuranceStatus::Created | InsuranceStatus::Flagged => {
                "Streak insurance used! Your streak is protected. 🛡️"
            }
            InsuranceStatus::AlreadyInsured => "This day is already protected by insurance.",
            InsuranceStatus::NoBalance => {
                "No insurance available. Keep your streak going to earn more!"
            }
            InsuranceStatus::OutOfWindow => {
                "Insurance can only protect days within your current streak."
            }
        }
    }
}

/// Result of [`HabitTracker::use_insurance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceOutcome {
    pub applied: bool,
    pub status: InsuranceStatus,
    pub date: NaiveDate,
    /// The insured row, when one exists after the call
    pub checkin: Option<Checkin>,
    pub insurance_available: u32,
    pub current_streak: u32,
    pub message: String,
    pub events: Vec<Event>,
}

/// Streak-aware front for a check-in store.
pub struct HabitTracker<R> {
    repo: R,
    engine: StreakEngine,
    milestones: Vec<u32>,
}

impl<R: CheckinRepository> HabitTracker<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            engine: StreakEngine::new(),
            milestones: DEFAULT_MILESTONES.to_vec(),
        }
    }

    pub fn with_engine(mut self, engine: StreakEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_milestones(mut self, milestones: impl IntoIterator<Item = u32>) -> Self {
        self.milestones = milestones.into_iter().collect();
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn engine(&self) -> &StreakEngine {
        &self.engine
    }

    /// Store a completed or missed check-in and report what it changed.
    ///
    /// Insured rows are only written by [`Self::use_insurance`], which checks
    /// the balance first; passing one here is a validation error.
    ///
    /// # Errors
    /// `NotFound` for an unknown habit, a validation error for a date after
    /// `today`, a conflict when the date already has a check-in, or a
    /// storage error.
    pub fn record_checkin(
        &self,
        habit_id: &str,
        new: &NewCheckin,
        today: NaiveDate,
    ) -> Result<CheckinReceipt> {
        reject_future(new.date, today)?;
        if new.used_insurance {
            return Err(ValidationError::InvalidValue {
                field: "used_insurance".into(),
                message: "grace days are spent through use_insurance".into(),
            }
            .into());
        }
        let new = new.clone().normalized();

        self.repo.atomically(habit_id, |repo| {
            repo.get_habit(habit_id)?;
            let mut history = repo.list_checkins(habit_id)?;
            let before = self.engine.current_streak(&history, today);
            let comeback = self.engine.comeback_status(&history, today);

            let checkin = repo.create_checkin(habit_id, &new)?;
            history.push(checkin.clone());
            let after = self.engine.current_streak(&history, today);

            let at = Utc::now();
            let mut events = vec![Event::CheckinRecorded {
                habit_id: habit_id.to_string(),
                date: checkin.date,
                completed: checkin.completed,
                current_streak: after,
                at,
            }];

            if after > before && self.milestones.contains(&after) {
                info!(habit_id, streak = after, "streak milestone reached");
                events.push(Event::StreakMilestone {
                    habit_id: habit_id.to_string(),
                    streak: after,
                    at,
                });
            }

            if before > 0 && after == 0 {
                info!(habit_id, previous_streak = before, "streak broken");
                events.push(Event::StreakBroken {
                    habit_id: habit_id.to_string(),
                    previous_streak: before,
                    at,
                });
            }

            if checkin.completed && checkin.date == today && comeback.level >= ComebackLevel::Moderate
            {
                info!(habit_id, days_away = comeback.days_since_last, "comeback check-in");
                events.push(Event::ComebackMade {
                    habit_id: habit_id.to_string(),
                    days_away: comeback.days_since_last,
                    level: comeback.level,
                    at,
                });
            }

            debug!(habit_id, date = %checkin.date, before, after, "check-in recorded");
            Ok(CheckinReceipt {
                checkin,
                current_streak: after,
                events,
            })
        })
    }

    /// Spend one grace day on `date` (default: `today`).
    ///
    /// An already-insured date is reported as applied without touching the
    /// balance, so repeating a call is harmless. Dates before
    /// `today - current_streak`, or an empty balance, write nothing and the
    /// outcome says why.
    ///
    /// # Errors
    /// `NotFound` for an unknown habit, a validation error for a date after
    /// `today`, or a storage error.
    pub fn use_insurance(
        &self,
        habit_id: &str,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<InsuranceOutcome> {
        let date = date.unwrap_or(today);
        reject_future(date, today)?;

        self.repo.atomically(habit_id, |repo| {
            repo.get_habit(habit_id)?;
            let mut history = repo.list_checkins(habit_id)?;
            let existing = history.iter().position(|c| c.date == date);

            let status = match existing {
                Some(idx) if history[idx].used_insurance => InsuranceStatus::AlreadyInsured,
                _ if date < self.engine.insurance_window_start(&history, today) => {
                    InsuranceStatus::OutOfWindow
                }
                _ if !self.engine.can_use_insurance(&history, today) => InsuranceStatus::NoBalance,
                Some(idx) => {
                    let flagged = repo.update_checkin_insurance_flag(&history[idx].id)?;
                    history[idx] = flagged;
                    InsuranceStatus::Flagged
                }
                None => {
                    let created = repo.create_checkin(habit_id, &NewCheckin::insured(date))?;
                    history.push(created);
                    InsuranceStatus::Created
                }
            };

            let stats = self.engine.streak_stats(&history, today);
            let checkin = history
                .iter()
                .find(|c| c.date == date && c.used_insurance)
                .cloned();

            let mut events = Vec::new();
            if matches!(status, InsuranceStatus::Created | InsuranceStatus::Flagged) {
                info!(
                    habit_id,
                    %date,
                    remaining = stats.insurance_available,
                    "streak insurance used"
                );
                events.push(Event::InsuranceUsed {
                    habit_id: habit_id.to_string(),
                    date,
                    insurance_remaining: stats.insurance_available,
                    at: Utc::now(),
                });
            } else {
                debug!(habit_id, %date, ?status, "insurance not spent");
            }

            Ok(InsuranceOutcome {
                applied: status.applied(),
                status,
                date,
                checkin,
                insurance_available: stats.insurance_available,
                current_streak: stats.current_streak,
                message: status.message().to_string(),
                events,
            })
        })
    }

    /// Stats, comeback and message for one habit from a single fetch.
    pub fn snapshot(&self, habit_id: &str, today: NaiveDate) -> Result<StreakSnapshot> {
        self.repo.get_habit(habit_id)?;
        let history = self.repo.list_checkins(habit_id)?;
        Ok(self.engine.snapshot(&history, today))
    }

    pub fn habit_summary(&self, habit_id: &str, today: NaiveDate) -> Result<HabitSummary> {
        let habit = self.repo.get_habit(habit_id)?;
        let history = self.repo.list_checkins(habit_id)?;
        let last = history.iter().map(|c| c.date).filter(|d| *d <= today).max();
        Ok(HabitSummary::new(&habit, self.engine.snapshot(&history, today), last))
    }

    /// Roll up every active habit of a user.
    pub fn user_progress(
        &self,
        user_id: &str,
        display_name: &str,
        today: NaiveDate,
    ) -> Result<UserProgress> {
        let habits = self.repo.list_habits(user_id, false)?;
        let mut summaries = Vec::with_capacity(habits.len());
        for habit in &habits {
            let history = self.repo.list_checkins(&habit.id)?;
            let last = history.iter().map(|c| c.date).filter(|d| *d <= today).max();
            summaries.push(HabitSummary::new(
                habit,
                self.engine.snapshot(&history, today),
                last,
            ));
        }
        Ok(UserProgress::build(user_id, display_name, today, summaries))
    }
}

fn reject_future(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        return Err(ValidationError::InvalidValue {
            field: "date".into(),
            message: format!("{date} is after {today}"),
        }
        .into());
    }
    Ok(())
}
