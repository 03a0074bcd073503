pub mod checkin;
pub mod config;
pub mod habit;
pub mod report;
pub mod streak;

use chrono::NaiveDate;
use quanta_core::habit::parse_date;
use quanta_core::{Config, Database, HabitTracker};
use tracing::debug;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// `--today` when given, otherwise the configured local day.
pub fn resolve_today(arg: Option<&str>, config: &Config) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match arg {
        Some(s) => Ok(parse_date(s)?),
        None => Ok(config.streak.today()),
    }
}

/// Tracker over the default database, configured from `config`.
pub fn open_tracker(config: &Config) -> Result<HabitTracker<Database>, Box<dyn std::error::Error>> {
    let tracker = HabitTracker::new(Database::open()?)
        .with_engine(config.streak.engine())
        .with_milestones(config.notifications.milestones.iter().copied());
    debug!(policy = ?config.streak.missing_today, "tracker opened");
    Ok(tracker)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
