//! Progress report commands for CLI.

use clap::Subcommand;
use quanta_core::{Config, Narrator, NotificationPlanner};
use serde_json::json;

use super::{open_tracker, print_json, resolve_today, CliResult};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Progress rollup and narrative for a user
    Progress {
        /// User ID
        #[arg(long)]
        user: String,
        /// Name used in the narrative (default: the user ID)
        #[arg(long)]
        name: Option<String>,
        /// Include per-habit insights
        #[arg(long)]
        insights: bool,
    },
    /// Summary and insights for one habit
    Habit {
        /// Habit ID
        habit_id: String,
    },
    /// Re-engagement nudges due for a user (default: every user)
    Nudges {
        /// User ID
        #[arg(long)]
        user: Option<String>,
    },
}

pub fn run(action: ReportAction, today: Option<&str>) -> CliResult {
    let config = Config::load()?;
    let today = resolve_today(today, &config)?;
    let tracker = open_tracker(&config)?;

    match action {
        ReportAction::Progress {
            user,
            name,
            insights,
        } => {
            let name = name.unwrap_or_else(|| user.clone());
            let progress = tracker.user_progress(&user, &name, today)?;
            let narrator = Narrator::from_config(&config.narrative)?;
            let narrative = narrator.progress_narrative(&progress);

            let habit_insights: Vec<_> = if insights {
                progress
                    .habits
                    .iter()
                    .map(|h| json!({ "habit_id": h.habit_id, "insights": narrator.habit_insights(h) }))
                    .collect()
            } else {
                Vec::new()
            };

            print_json(&json!({
                "progress": progress,
                "narrative": narrative,
                "habit_insights": habit_insights,
            }))?;
        }
        ReportAction::Habit { habit_id } => {
            let summary = tracker.habit_summary(&habit_id, today)?;
            let narrator = Narrator::from_config(&config.narrative)?;
            let insights = narrator.habit_insights(&summary);
            print_json(&json!({ "summary": summary, "insights": insights }))?;
        }
        ReportAction::Nudges { user } => {
            let planner = NotificationPlanner::new(config.notifications.clone());
            match user {
                Some(user) => {
                    let progress = tracker.user_progress(&user, &user, today)?;
                    print_json(&planner.plan_for_user(&progress))?;
                }
                None => {
                    let mut due = Vec::new();
                    for user in tracker.repository().list_user_ids()? {
                        let progress = tracker.user_progress(&user, &user, today)?;
                        let nudges = planner.plan_for_user(&progress);
                        if !nudges.is_empty() {
                            due.push(json!({ "user_id": user, "nudges": nudges }));
                        }
                    }
                    print_json(&due)?;
                }
            }
        }
    }
    Ok(())
}
