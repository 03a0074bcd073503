use super::{Insight, InsightKind, NarrativeService, NarrativeSource, ProgressNarrative};
use crate::error::NarrativeError;
use crate::rollup::{HabitSummary, UserProgress};

const RECOMMENDATIONS: [&str; 3] = [
    "Try starting with small, easy habits first 🎯",
    "Set reminders to help you remember 📱",
    "Celebrate your wins, no matter how small! 🎉",
];

/// Canned reports keyed on completion rate. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackNarrator;

impl FallbackNarrator {
    pub fn progress_report(&self, progress: &UserProgress) -> ProgressNarrative {
        let name = &progress.display_name;
        let rate = progress.overall_completion_rate;

        let motivational_message = if rate >= 80.0 {
            format!("Amazing work, {name}! You're absolutely crushing it! 🏆")
        } else if rate >= 60.0 {
            format!("Great progress, {name}! You're building fantastic habits! 🌟")
        } else if rate >= 40.0 {
            format!("Nice effort, {name}! Every step counts on your journey! 💪")
        } else {
            format!("Hey {name}, every hero starts somewhere! Let's build those habits together! 🚀")
        };

        ProgressNarrative {
            title: format!("Progress Report for {name}"),
            summary: format!(
                "You've completed {rate:.1}% of your habit goals. Keep up the great work!"
            ),
            completion_rate: rate,
            insights: Vec::new(),
            motivational_message,
            recommendations: RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
            source: NarrativeSource::Fallback,
        }
    }

    pub fn insights_for(&self, habit: &HabitSummary) -> Vec<Insight> {
        let title = &habit.title;
        let streak = habit.stats.current_streak;
        let mut insights = Vec::with_capacity(2);

        if streak > 0 {
            insights.push(Insight {
                kind: InsightKind::Strength,
                title: "Great Streak!".into(),
                description: format!("You've kept up {title} for {streak} days! That's awesome! 🔥"),
                confidence: 1.0,
                action_items: Vec::new(),
            });
        }

        insights.push(Insight {
            kind: InsightKind::Recommendation,
            title: "Keep Going!".into(),
            description: format!(
                "Stay consistent with {title} - you're building something amazing! 💪"
            ),
            confidence: 0.9,
            action_items: Vec::new(),
        });

        insights
    }
}

impl NarrativeService for FallbackNarrator {
    fn name(&self) -> &str {
        "fallback"
    }

    fn generate_progress_narrative(
        &self,
        progress: &UserProgress,
    ) -> Result<ProgressNarrative, NarrativeError> {
        Ok(self.progress_report(progress))
    }

    fn generate_habit_insights(&self, habit: &HabitSummary) -> Result<Vec<Insight>, NarrativeError> {
        Ok(self.insights_for(habit))
    }
}
