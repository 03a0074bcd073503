//! Check-in commands for CLI.

use clap::Subcommand;
use quanta_core::habit::parse_date;
use quanta_core::{Channel, Config, NewCheckin, NotificationPlanner};
use serde_json::json;

use super::{open_tracker, print_json, resolve_today, CliResult};

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Record a check-in for a habit
    Add {
        /// Habit ID
        habit_id: String,
        /// Day being checked in (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Record the day as missed instead of completed
        #[arg(long)]
        missed: bool,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
        /// web, telegram, whatsapp or email (default: web)
        #[arg(long, default_value = "web")]
        channel: String,
    },
}

pub fn run(action: CheckinAction, today: Option<&str>) -> CliResult {
    let config = Config::load()?;
    let today = resolve_today(today, &config)?;
    let tracker = open_tracker(&config)?;

    match action {
        CheckinAction::Add {
            habit_id,
            date,
            missed,
            note,
            channel,
        } => {
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => today,
            };
            let channel = Channel::parse(&channel)
                .ok_or_else(|| format!("unknown channel '{channel}'"))?;

            let mut new = if missed {
                NewCheckin::missed(date)
            } else {
                NewCheckin::completed(date)
            }
            .via(channel);
            if let Some(note) = note {
                new = new.with_note(note);
            }

            let receipt = tracker.record_checkin(&habit_id, &new, today)?;
            let nudges = NotificationPlanner::new(config.notifications.clone())
                .plan_for_events(&receipt.events);
            eprintln!("Check-in recorded: {}", receipt.checkin.id);
            print_json(&json!({
                "checkin": receipt.checkin,
                "current_streak": receipt.current_streak,
                "events": receipt.events,
                "nudges": nudges,
            }))?;
        }
    }
    Ok(())
}
