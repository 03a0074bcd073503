//! Streak and insurance computation over a habit's check-in history.
//!
//! Every query takes the reference date `today` explicitly; the engine never
//! reads the clock. Input order does not matter: each query sorts a local
//! view of the slice it was given.
//!
//! Two insurance quantities live here and must not be conflated:
//! - the **walk-local cap** ([`WALK_INSURANCE_CAP`]): how many insured or
//!   bridged days a single backward walk may count;
//! - the **insurance balance** ([`StreakEngine::insurance_count`]): grace
//!   days earned from the current streak minus those already spent in it.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::comeback::{streak_message, ComebackStatus};
use crate::habit::Checkin;

/// Insured or bridged days a single backward walk may count.
pub const WALK_INSURANCE_CAP: u32 = 2;

/// Streak days needed to earn one grace day.
pub const DAYS_PER_INSURANCE: u32 = 7;

/// How to treat a history with no row at all for `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingToday {
    /// Today is not decided yet: the walk starts at yesterday and no grace
    /// day is spent on today.
    #[default]
    Pending,
    /// No row today means the streak is broken.
    Strict,
}

/// Aggregate statistics for one habit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreakStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: u32,
    pub total_checkins: u32,
    /// Percentage of check-ins completed, one decimal
    pub completion_rate: f64,
    pub insurance_available: u32,
}

/// Everything a caller needs about a habit, computed from one history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakSnapshot {
    pub today: NaiveDate,
    pub stats: StreakStats,
    pub can_use_insurance: bool,
    pub comeback: ComebackStatus,
    pub motivational_message: String,
}

/// Result of a backward walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakWalk {
    /// Days counted
    pub length: u32,
    /// Walk-local insurance consumed (insured days plus bridged gaps)
    pub insurance_used: u32,
    /// Oldest counted day
    pub started_on: Option<NaiveDate>,
}

/// Pure streak engine.
#[derive(Debug, Clone, Default)]
pub struct StreakEngine {
    missing_today: MissingToday,
}

impl StreakEngine {
    /// Create an engine with the default [`MissingToday::Pending`] policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(missing_today: MissingToday) -> Self {
        Self { missing_today }
    }

    pub fn policy(&self) -> MissingToday {
        self.missing_today
    }

    /// Length of the streak ending at `today`.
    pub fn current_streak(&self, checkins: &[Checkin], today: NaiveDate) -> u32 {
        self.walk(checkins, today).length
    }

    /// Walk backward from `today`, counting completed or insured days.
    ///
    /// A missing day is bridged only when it is a single day, a walk-local
    /// token remains, and the older row is itself a success; the bridge
    /// spends one token and counts the older row.
    pub fn walk(&self, checkins: &[Checkin], today: NaiveDate) -> StreakWalk {
        let rows = descending(checkins);
        let mut walk = StreakWalk::default();

        let has_today = rows.iter().any(|c| c.date == today);
        let mut cursor = if has_today {
            Some(today)
        } else {
            match self.missing_today {
                MissingToday::Strict => return walk,
                MissingToday::Pending => today.pred_opt(),
            }
        };

        for row in rows.into_iter().filter(|c| c.date <= today) {
            let Some(expected) = cursor else { break };

            if row.date > expected {
                continue;
            }

            if row.date == expected {
                if row.completed {
                    walk.length += 1;
                } else if row.used_insurance && walk.insurance_used < WALK_INSURANCE_CAP {
                    walk.length += 1;
                    walk.insurance_used += 1;
                } else {
                    break;
                }
            } else {
                let gap = (expected - row.date).num_days();
                if gap == 1 && walk.insurance_used < WALK_INSURANCE_CAP && row.is_success() {
                    walk.length += 1;
                    walk.insurance_used += 1;
                } else {
                    break;
                }
            }

            walk.started_on = Some(row.date);
            cursor = row.date.pred_opt();
        }

        walk
    }

    /// Longest run ever recorded, ignoring bridges.
    ///
    /// A run extends through completed-or-insured days on consecutive dates
    /// and resets on a plain miss or a calendar gap.
    pub fn longest_run(&self, checkins: &[Checkin]) -> u32 {
        let mut rows: Vec<&Checkin> = checkins.iter().collect();
        rows.sort_by_key(|c| c.date);

        let mut best = 0;
        let mut run = 0;
        let mut last: Option<NaiveDate> = None;

        for row in rows {
            if let Some(prev) = last {
                if (row.date - prev).num_days() > 1 {
                    run = 0;
                }
            }
            if row.is_success() {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
            last = Some(row.date);
        }

        best
    }

    /// Grace days available: one per [`DAYS_PER_INSURANCE`] streak days,
    /// minus insured days already inside the current streak window.
    pub fn insurance_count(&self, checkins: &[Checkin], today: NaiveDate) -> u32 {
        let streak = self.current_streak(checkins, today);
        self.insurance_balance(checkins, today, streak)
    }

    pub fn can_use_insurance(&self, checkins: &[Checkin], today: NaiveDate) -> bool {
        self.insurance_count(checkins, today) > 0
    }

    /// First day a grace day may be spent on: `today - current_streak`.
    /// Insured rows before it are not charged against the balance.
    pub fn insurance_window_start(&self, checkins: &[Checkin], today: NaiveDate) -> NaiveDate {
        window_start(today, self.current_streak(checkins, today))
    }

    fn insurance_balance(&self, checkins: &[Checkin], today: NaiveDate, streak: u32) -> u32 {
        let earned = streak / DAYS_PER_INSURANCE;
        let window_start = window_start(today, streak);
        let used = checkins
            .iter()
            .filter(|c| c.used_insurance && c.date >= window_start && c.date <= today)
            .count() as u32;
        earned.saturating_sub(used)
    }

    pub fn streak_stats(&self, checkins: &[Checkin], today: NaiveDate) -> StreakStats {
        let current = self.current_streak(checkins, today);
        self.stats_with_current(checkins, today, current)
    }

    fn stats_with_current(&self, checkins: &[Checkin], today: NaiveDate, current: u32) -> StreakStats {
        let total_checkins = checkins.len() as u32;
        let total_completions = checkins.iter().filter(|c| c.completed).count() as u32;

        StreakStats {
            current_streak: current,
            // A bridged gap counts toward the current streak but resets a run.
            longest_streak: self.longest_run(checkins).max(current),
            total_completions,
            total_checkins,
            completion_rate: completion_rate(total_completions, total_checkins),
            insurance_available: self.insurance_balance(checkins, today, current),
        }
    }

    pub fn comeback_status(&self, checkins: &[Checkin], today: NaiveDate) -> ComebackStatus {
        ComebackStatus::assess(checkins, today)
    }

    /// Comeback message when lapsed, otherwise the streak tier message.
    pub fn motivational_message(&self, checkins: &[Checkin], today: NaiveDate) -> String {
        let comeback = self.comeback_status(checkins, today);
        match comeback.message {
            Some(message) if comeback.is_comeback => message,
            _ => streak_message(self.current_streak(checkins, today)),
        }
    }

    /// Stats, comeback and message from the same history.
    pub fn snapshot(&self, checkins: &[Checkin], today: NaiveDate) -> StreakSnapshot {
        let current = self.current_streak(checkins, today);
        let stats = self.stats_with_current(checkins, today, current);
        let comeback = self.comeback_status(checkins, today);
        let motivational_message = match &comeback.message {
            Some(message) if comeback.is_comeback => message.clone(),
            _ => streak_message(current),
        };

        StreakSnapshot {
            today,
            can_use_insurance: stats.insurance_available > 0,
            stats,
            comeback,
            motivational_message,
        }
    }
}

/// `completions / checkins * 100`, rounded to one decimal; 0 for no check-ins.
pub fn completion_rate(completions: u32, checkins: u32) -> f64 {
    if checkins == 0 {
        return 0.0;
    }
    let pct = f64::from(completions) / f64::from(checkins) * 100.0;
    (pct * 10.0).round() / 10.0
}

fn descending(checkins: &[Checkin]) -> Vec<&Checkin> {
    let mut rows: Vec<&Checkin> = checkins.iter().collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

fn window_start(today: NaiveDate, streak: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(streak)))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::Channel;
    use crate::streak::ComebackLevel;
    use chrono::Utc;

    fn day(offset: i64) -> NaiveDate {
        today() - chrono::Duration::days(offset)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn row(offset: i64, completed: bool, used_insurance: bool) -> Checkin {
        let date = day(offset);
        Checkin {
            id: format!("c-{date}"),
            habit_id: "h1".to_string(),
            date,
            completed,
            used_insurance,
            note: None,
            channel: Channel::Web,
            created_at: Utc::now(),
        }
    }

    fn done(offsets: impl IntoIterator<Item = i64>) -> Vec<Checkin> {
        offsets.into_iter().map(|o| row(o, true, false)).collect()
    }

    #[test]
    fn three_completed_days_make_a_streak_of_three() {
        let engine = StreakEngine::new();
        let history = done([0, 1, 2]);
        assert_eq!(engine.current_streak(&history, today()), 3);
    }

    #[test]
    fn plain_miss_today_zeroes_streak() {
        let engine = StreakEngine::new();
        let mut history = done(1..=10);
        history.push(row(0, false, false));
        assert_eq!(engine.current_streak(&history, today()), 0);
    }

    #[test]
    fn empty_history_is_all_zero() {
        let engine = StreakEngine::new();
        let stats = engine.streak_stats(&[], today());
        assert_eq!(stats, StreakStats::default());
        assert!(!engine.can_use_insurance(&[], today()));
        let comeback = engine.comeback_status(&[], today());
        assert!(!comeback.is_comeback);
        assert_eq!(comeback.level, ComebackLevel::None);
    }

    #[test]
    fn insured_day_continues_streak() {
        let engine = StreakEngine::new();
        let mut history = done([0, 2, 3]);
        history.push(row(1, false, true));
        let walk = engine.walk(&history, today());
        assert_eq!(walk.length, 4);
        assert_eq!(walk.insurance_used, 1);
        assert_eq!(walk.started_on, Some(day(3)));
    }

    #[test]
    fn walk_cap_stops_third_insured_day() {
        let engine = StreakEngine::new();
        let history = vec![
            row(0, true, false),
            row(1, false, true),
            row(2, false, true),
            row(3, false, true),
            row(4, true, false),
        ];
        assert_eq!(engine.current_streak(&history, today()), 3);
    }

    #[test]
    fn single_missing_day_is_bridged_when_older_day_succeeded() {
        let engine = StreakEngine::new();
        // today done, yesterday missing, then two done days
        let history = done([0, 2, 3]);
        let walk = engine.walk(&history, today());
        assert_eq!(walk.length, 3);
        assert_eq!(walk.insurance_used, 1);
    }

    #[test]
    fn bridge_requires_older_day_success() {
        let engine = StreakEngine::new();
        let history = vec![row(0, true, false), row(2, false, false), row(3, true, false)];
        assert_eq!(engine.current_streak(&history, today()), 1);
    }

    #[test]
    fn bridge_accepts_insured_older_day() {
        let engine = StreakEngine::new();
        let history = vec![row(0, true, false), row(2, false, true), row(3, true, false)];
        assert_eq!(engine.current_streak(&history, today()), 3);
    }

    #[test]
    fn two_day_gap_breaks_streak() {
        let engine = StreakEngine::new();
        let history = done([0, 3, 4]);
        assert_eq!(engine.current_streak(&history, today()), 1);
    }

    #[test]
    fn bridges_share_the_walk_cap() {
        let engine = StreakEngine::new();
        // gaps at 1, 3 and 5; only two may be bridged
        let history = done([0, 2, 4, 6]);
        assert_eq!(engine.current_streak(&history, today()), 3);
    }

    #[test]
    fn missing_today_pending_counts_from_yesterday() {
        let engine = StreakEngine::with_policy(MissingToday::Pending);
        let history = done(1..=5);
        let walk = engine.walk(&history, today());
        assert_eq!(walk.length, 5);
        assert_eq!(walk.insurance_used, 0);
    }

    #[test]
    fn missing_today_pending_still_breaks_on_older_gap() {
        let engine = StreakEngine::with_policy(MissingToday::Pending);
        // nothing since three days ago
        let history = done(3..=6);
        assert_eq!(engine.current_streak(&history, today()), 0);
    }

    #[test]
    fn missing_today_pending_bridges_one_day_before_yesterday() {
        let engine = StreakEngine::with_policy(MissingToday::Pending);
        let history = done(2..=4);
        assert_eq!(engine.current_streak(&history, today()), 3);
    }

    #[test]
    fn missing_today_strict_breaks_immediately() {
        let engine = StreakEngine::with_policy(MissingToday::Strict);
        let history = done(1..=5);
        assert_eq!(engine.current_streak(&history, today()), 0);
    }

    #[test]
    fn future_rows_are_ignored() {
        let engine = StreakEngine::new();
        let mut history = done([0, 1]);
        history.push(row(-1, true, false));
        assert_eq!(engine.current_streak(&history, today()), 2);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let engine = StreakEngine::new();
        let mut history = done([2, 0, 1]);
        history.reverse();
        assert_eq!(engine.current_streak(&history, today()), 3);
    }

    #[test]
    fn longest_streak_resets_on_gap_and_miss() {
        let engine = StreakEngine::new();
        let mut history = done([20, 19, 18, 17]);
        history.extend(done([15, 14]));
        history.push(row(13, false, false));
        history.extend(done([12, 11, 10]));
        assert_eq!(engine.longest_run(&history), 4);
    }

    #[test]
    fn longest_streak_counts_insured_days() {
        let engine = StreakEngine::new();
        let history = vec![
            row(10, true, false),
            row(9, false, true),
            row(8, true, false),
        ];
        assert_eq!(engine.longest_run(&history), 3);
    }

    #[test]
    fn longest_never_below_current() {
        let engine = StreakEngine::new();
        // bridged gap: current 3, raw longest run 2
        let history = done([0, 2, 3]);
        let stats = engine.streak_stats(&history, today());
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
    }

    #[test]
    fn completion_rate_rounds_to_one_decimal() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(1, 3), 33.3);
        assert_eq!(completion_rate(2, 3), 66.7);
        assert_eq!(completion_rate(5, 5), 100.0);
    }

    #[test]
    fn stats_totals() {
        let engine = StreakEngine::new();
        let history = vec![
            row(0, true, false),
            row(1, false, false),
            row(2, true, false),
            row(3, false, true),
        ];
        let stats = engine.streak_stats(&history, today());
        assert_eq!(stats.total_checkins, 4);
        assert_eq!(stats.total_completions, 2);
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn seven_day_streak_ending_yesterday_earns_one_grace_day() {
        let engine = StreakEngine::new();
        let history = done(1..=7);
        assert_eq!(engine.current_streak(&history, today()), 7);
        assert_eq!(engine.insurance_count(&history, today()), 1);
        assert!(engine.can_use_insurance(&history, today()));
    }

    #[test]
    fn spent_grace_day_is_subtracted() {
        let engine = StreakEngine::new();
        let mut history = done(1..=7);
        history.push(row(0, false, true));
        assert_eq!(engine.current_streak(&history, today()), 8);
        assert_eq!(engine.insurance_count(&history, today()), 0);
    }

    #[test]
    fn fourteen_days_earn_two() {
        let engine = StreakEngine::new();
        let history = done(0..14);
        assert_eq!(engine.insurance_count(&history, today()), 2);
    }

    #[test]
    fn insurance_window_starts_streak_days_back() {
        let engine = StreakEngine::new();
        assert_eq!(engine.insurance_window_start(&done(1..=7), today()), day(7));
        assert_eq!(engine.insurance_window_start(&[], today()), today());

        // rows outside the window do not reduce the balance
        let mut history = done(1..=7);
        history.push(row(20, false, true));
        assert_eq!(engine.insurance_count(&history, today()), 1);
    }

    #[test]
    fn balance_never_negative() {
        let engine = StreakEngine::new();
        let history = vec![row(0, false, true), row(1, false, true)];
        assert_eq!(engine.insurance_count(&history, today()), 0);
    }

    #[test]
    fn motivational_tiers_follow_streak() {
        let engine = StreakEngine::new();
        assert!(engine
            .motivational_message(&[], today())
            .contains("Every expert was once a beginner"));
        assert!(engine
            .motivational_message(&done([0]), today())
            .contains("One day down"));
        assert!(engine
            .motivational_message(&done(0..7), today())
            .contains("7 day streak! You're on fire!"));
    }

    #[test]
    fn snapshot_matches_individual_queries() {
        let engine = StreakEngine::new();
        let history = done(1..=9);
        let snap = engine.snapshot(&history, today());
        assert_eq!(snap.stats, engine.streak_stats(&history, today()));
        assert_eq!(snap.comeback, engine.comeback_status(&history, today()));
        assert_eq!(
            snap.motivational_message,
            engine.motivational_message(&history, today())
        );
        assert!(snap.can_use_insurance);
    }
}
