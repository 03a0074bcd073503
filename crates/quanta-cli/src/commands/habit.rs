//! Habit management commands for CLI.

use clap::Subcommand;
use quanta_core::storage::CheckinRepository;
use quanta_core::{Cadence, Config, Difficulty, NewHabit};
use serde_json::json;

use super::{open_tracker, print_json, resolve_today, CliResult};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Create {
        /// Habit title
        title: String,
        /// Owning user ID
        #[arg(long)]
        user: String,
        /// daily or weekly (default: daily)
        #[arg(long, default_value = "daily")]
        cadence: String,
        /// 1 (easy) to 3 (hard)
        #[arg(long, default_value = "1")]
        difficulty: i64,
        /// When and where the habit happens
        #[arg(long, default_value = "")]
        anchor: String,
        /// Smallest version of the habit
        #[arg(long, default_value = "")]
        micro_habit: String,
        /// Display order
        #[arg(long, default_value = "0")]
        order: i64,
    },
    /// List a user's habits
    List {
        /// Owning user ID
        #[arg(long)]
        user: String,
        /// Include deactivated habits
        #[arg(long)]
        all: bool,
    },
    /// Show a habit with its streak snapshot
    Show {
        /// Habit ID
        id: String,
    },
    /// Deactivate a habit, keeping its history
    Deactivate {
        /// Habit ID
        id: String,
    },
    /// Delete a habit and all its check-ins
    Delete {
        /// Habit ID
        id: String,
    },
}

pub fn run(action: HabitAction, today: Option<&str>) -> CliResult {
    let config = Config::load()?;
    let tracker = open_tracker(&config)?;
    let db = tracker.repository();

    match action {
        HabitAction::Create {
            title,
            user,
            cadence,
            difficulty,
            anchor,
            micro_habit,
            order,
        } => {
            let cadence = Cadence::parse(&cadence)
                .ok_or_else(|| format!("unknown cadence '{cadence}' (expected daily or weekly)"))?;
            let new = NewHabit {
                cadence,
                difficulty: Difficulty::new(difficulty)?,
                anchor,
                micro_habit,
                order,
                ..NewHabit::new(user, title)
            };
            let habit = db.create_habit(&new)?;
            eprintln!("Habit created: {}", habit.id);
            print_json(&habit)?;
        }
        HabitAction::List { user, all } => {
            let habits = db.list_habits(&user, all)?;
            print_json(&habits)?;
        }
        HabitAction::Show { id } => {
            let today = resolve_today(today, &config)?;
            let habit = db.get_habit(&id)?;
            let snapshot = tracker.snapshot(&id, today)?;
            print_json(&json!({ "habit": habit, "streak": snapshot }))?;
        }
        HabitAction::Deactivate { id } => {
            let habit = db.set_habit_active(&id, false)?;
            eprintln!("Habit deactivated: {}", habit.id);
            print_json(&habit)?;
        }
        HabitAction::Delete { id } => {
            db.delete_habit(&id)?;
            println!("Habit deleted: {id}");
        }
    }
    Ok(())
}
