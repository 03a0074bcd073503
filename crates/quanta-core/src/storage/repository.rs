use chrono::NaiveDate;

use crate::error::Result;
use crate::habit::{Checkin, Habit, NewCheckin};

/// Storage the streak engine's callers depend on.
///
/// Implementations must keep at most one check-in per (habit, date) and
/// reject a duplicate with a conflict error rather than overwriting it.
pub trait CheckinRepository {
    /// Fetch a habit, or `NotFound`.
    fn get_habit(&self, habit_id: &str) -> Result<Habit>;

    /// Habits of a user in display order; inactive ones only on request.
    fn list_habits(&self, user_id: &str, include_inactive: bool) -> Result<Vec<Habit>>;

    /// All check-ins of a habit, newest date first.
    fn list_checkins(&self, habit_id: &str) -> Result<Vec<Checkin>>;

    /// The check-in for `date`, if any.
    fn find_checkin(&self, habit_id: &str, date: NaiveDate) -> Result<Option<Checkin>>;

    /// Insert a check-in; a second one for the same date is a conflict.
    fn create_checkin(&self, habit_id: &str, checkin: &NewCheckin) -> Result<Checkin>;

    /// Set `used_insurance` on an existing check-in. No-op when already set.
    fn update_checkin_insurance_flag(&self, checkin_id: &str) -> Result<Checkin>;

    /// Run `f` so that no other writer touches the habit's check-ins until it
    /// returns. An `Err` from `f` discards its writes.
    fn atomically<T, F>(&self, habit_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}
