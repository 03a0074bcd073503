//! Streak commands for CLI.

use clap::Subcommand;
use quanta_core::habit::parse_date;
use quanta_core::{Config, NotificationPlanner};
use serde_json::json;

use super::{open_tracker, print_json, resolve_today, CliResult};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Streak statistics for a habit
    Stats {
        /// Habit ID
        habit_id: String,
    },
    /// Grace days available
    Insurance {
        /// Habit ID
        habit_id: String,
    },
    /// Spend a grace day
    UseInsurance {
        /// Habit ID
        habit_id: String,
        /// Day to protect (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Comeback classification
    Comeback {
        /// Habit ID
        habit_id: String,
    },
    /// Motivational message
    Message {
        /// Habit ID
        habit_id: String,
    },
}

pub fn run(action: StreakAction, today: Option<&str>) -> CliResult {
    let config = Config::load()?;
    let today = resolve_today(today, &config)?;
    let tracker = open_tracker(&config)?;

    match action {
        StreakAction::Stats { habit_id } => {
            let snapshot = tracker.snapshot(&habit_id, today)?;
            print_json(&snapshot.stats)?;
        }
        StreakAction::Insurance { habit_id } => {
            let snapshot = tracker.snapshot(&habit_id, today)?;
            print_json(&json!({
                "insurance_available": snapshot.stats.insurance_available,
                "can_use_insurance": snapshot.can_use_insurance,
            }))?;
        }
        StreakAction::UseInsurance { habit_id, date } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            let outcome = tracker.use_insurance(&habit_id, date, today)?;
            let nudges = NotificationPlanner::new(config.notifications.clone())
                .plan_for_events(&outcome.events);
            eprintln!("{}", outcome.message);
            print_json(&json!({ "outcome": outcome, "nudges": nudges }))?;
        }
        StreakAction::Comeback { habit_id } => {
            let snapshot = tracker.snapshot(&habit_id, today)?;
            print_json(&snapshot.comeback)?;
        }
        StreakAction::Message { habit_id } => {
            let snapshot = tracker.snapshot(&habit_id, today)?;
            println!("{}", snapshot.motivational_message);
        }
    }
    Ok(())
}
