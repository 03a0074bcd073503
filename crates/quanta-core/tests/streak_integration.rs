//! Integration tests for streaks and insurance over a real database.
//!
//! Each scenario stores check-ins through the tracker, then reads the
//! streak back the way the CLI does.

use chrono::{Days, NaiveDate};
use quanta_core::storage::CheckinRepository;
use quanta_core::{
    ComebackLevel, Database, HabitTracker, InsuranceStatus, MissingToday, NewCheckin, NewHabit,
    StreakEngine,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 15).unwrap()
}

fn ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap()
}

fn setup() -> (HabitTracker<Database>, String) {
    let db = Database::open_memory().unwrap();
    let habit = db.create_habit(&NewHabit::new("user-1", "Drink water")).unwrap();
    (HabitTracker::new(db), habit.id)
}

fn complete(t: &HabitTracker<Database>, id: &str, days_ago: impl IntoIterator<Item = u64>) {
    for n in days_ago {
        t.record_checkin(id, &NewCheckin::completed(ago(n)), today())
            .unwrap();
    }
}

#[test]
fn test_three_consecutive_days() {
    let (t, id) = setup();
    complete(&t, &id, [2, 1, 0]);

    let snap = t.snapshot(&id, today()).unwrap();
    assert_eq!(snap.stats.current_streak, 3);
    assert_eq!(snap.stats.longest_streak, 3);
    assert_eq!(snap.stats.completion_rate, 100.0);
}

#[test]
fn test_miss_today_zeroes_long_streak() {
    let (t, id) = setup();
    complete(&t, &id, (1..=10).rev());
    t.record_checkin(&id, &NewCheckin::missed(today()), today())
        .unwrap();

    let snap = t.snapshot(&id, today()).unwrap();
    assert_eq!(snap.stats.current_streak, 0);
    assert_eq!(snap.stats.longest_streak, 10);
    assert_eq!(snap.stats.insurance_available, 0);
}

#[test]
fn test_week_streak_earns_and_spends_grace_day() {
    let (t, id) = setup();
    complete(&t, &id, (1..=7).rev());

    let before = t.snapshot(&id, today()).unwrap();
    assert_eq!(before.stats.current_streak, 7);
    assert_eq!(before.stats.insurance_available, 1);
    assert!(before.can_use_insurance);

    let outcome = t.use_insurance(&id, None, today()).unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.status, InsuranceStatus::Created);

    let row = t
        .repository()
        .find_checkin(&id, today())
        .unwrap()
        .expect("insured row for today");
    assert!(row.used_insurance);
    assert!(!row.completed);

    let after = t.snapshot(&id, today()).unwrap();
    assert_eq!(after.stats.current_streak, 8);
    assert_eq!(after.stats.insurance_available, 0);
}

#[test]
fn test_five_days_away_is_moderate_comeback() {
    let (t, id) = setup();
    complete(&t, &id, [5]);

    let comeback = t.snapshot(&id, today()).unwrap().comeback;
    assert!(comeback.is_comeback);
    assert_eq!(comeback.days_since_last, 5);
    assert_eq!(comeback.level, ComebackLevel::Moderate);
    assert_eq!(
        comeback.message.as_deref(),
        Some("Time for a comeback! Let's get back on track after 5 days.")
    );
}

#[test]
fn test_no_history_is_all_zero() {
    let (t, id) = setup();
    let snap = t.snapshot(&id, today()).unwrap();

    assert_eq!(snap.stats.current_streak, 0);
    assert_eq!(snap.stats.longest_streak, 0);
    assert_eq!(snap.stats.total_checkins, 0);
    assert_eq!(snap.stats.completion_rate, 0.0);
    assert_eq!(snap.stats.insurance_available, 0);
    assert!(!snap.comeback.is_comeback);
    assert_eq!(
        snap.motivational_message,
        "🌟 Every expert was once a beginner. Your journey starts now!"
    );
}

#[test]
fn test_no_row_today_pending_counts_through_yesterday() {
    let (t, id) = setup();
    complete(&t, &id, [3, 2, 1]);
    assert_eq!(t.snapshot(&id, today()).unwrap().stats.current_streak, 3);
}

#[test]
fn test_no_row_today_strict_is_zero() {
    let (t, id) = setup();
    complete(&t, &id, [3, 2, 1]);
    let strict = t.with_engine(StreakEngine::with_policy(MissingToday::Strict));
    assert_eq!(strict.snapshot(&id, today()).unwrap().stats.current_streak, 0);
}

#[test]
fn test_use_insurance_twice_equals_once() {
    let (t, id) = setup();
    complete(&t, &id, (1..=7).rev());

    let first = t.use_insurance(&id, Some(today()), today()).unwrap();
    let second = t.use_insurance(&id, Some(today()), today()).unwrap();

    assert!(first.applied);
    assert!(second.applied);
    assert_eq!(second.status, InsuranceStatus::AlreadyInsured);
    let rows = t.repository().list_checkins(&id).unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows.iter().filter(|c| c.used_insurance).count(), 1);
}

#[test]
fn test_insurance_with_empty_balance_writes_nothing() {
    let (t, id) = setup();
    complete(&t, &id, [2, 1]);

    let outcome = t.use_insurance(&id, None, today()).unwrap();
    assert!(!outcome.applied);
    assert_eq!(outcome.status, InsuranceStatus::NoBalance);
    assert_eq!(t.repository().list_checkins(&id).unwrap().len(), 2);
}

#[test]
fn test_grace_day_cannot_be_spent_outside_streak() {
    let (t, id) = setup();
    complete(&t, &id, (1..=7).rev());

    let mut applied = 0;
    for n in 1..=5 {
        let future = today().checked_add_days(Days::new(n)).unwrap();
        assert!(t.use_insurance(&id, Some(future), today()).is_err());
    }
    for n in [20, 30, 40, 0, 3] {
        if t.use_insurance(&id, Some(ago(n)), today()).unwrap().applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    let insured = t
        .repository()
        .list_checkins(&id)
        .unwrap()
        .into_iter()
        .filter(|c| c.used_insurance)
        .count();
    assert_eq!(insured, 1);
    assert_eq!(t.snapshot(&id, today()).unwrap().stats.insurance_available, 0);
}

#[test]
fn test_concurrent_insurance_spends_one_token() {
    use std::sync::Barrier;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quanta.db");

    let habit_id = {
        let db = Database::open_at(&path).unwrap();
        let habit = db.create_habit(&NewHabit::new("user-1", "Journal")).unwrap();
        let t = HabitTracker::new(db);
        complete(&t, &habit.id, (1..=7).rev());
        habit.id
    };

    // Two different dates, so neither call can be an idempotent repeat.
    let barrier = Barrier::new(2);
    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = [today(), ago(5)]
            .into_iter()
            .map(|date| {
                let (path, habit_id, barrier) = (&path, &habit_id, &barrier);
                s.spawn(move || {
                    let t = HabitTracker::new(Database::open_at(path).unwrap());
                    barrier.wait();
                    t.use_insurance(habit_id, Some(date), today()).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let applied = outcomes.iter().filter(|o| o.applied).count();
    assert_eq!(applied, 1);

    let db = Database::open_at(&path).unwrap();
    let insured = db
        .list_checkins(&habit_id)
        .unwrap()
        .into_iter()
        .filter(|c| c.used_insurance)
        .count();
    assert_eq!(insured, 1);
}

#[test]
fn test_duplicate_checkin_rejected_and_history_unchanged() {
    let (t, id) = setup();
    complete(&t, &id, [0]);
    let err = t
        .record_checkin(&id, &NewCheckin::completed(today()), today())
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(t.repository().list_checkins(&id).unwrap().len(), 1);
}

#[test]
fn test_deleted_habit_takes_checkins_along() {
    let (t, id) = setup();
    complete(&t, &id, [1, 0]);
    t.repository().delete_habit(&id).unwrap();
    assert!(t.snapshot(&id, today()).is_err());

    let orphans: i64 = t
        .repository()
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM checkins WHERE habit_id = ?1",
            [&id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
}
