//! Progress narratives: prose reports built from a [`UserProgress`].
//!
//! Generation sits behind [`NarrativeService`]. The [`Narrator`] asks the
//! configured service first and answers from [`FallbackNarrator`] whenever
//! the service is missing or fails, so callers always get a report.

mod fallback;
mod http;

pub use fallback::FallbackNarrator;
pub use http::HttpNarrativeService;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::NarrativeError;
use crate::rollup::{HabitSummary, UserProgress};
use crate::storage::NarrativeConfig;

/// What an insight is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Strength,
    Challenge,
    Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    /// 0.0 to 1.0
    pub confidence: f64,
    #[serde(default)]
    pub action_items: Vec<String>,
}

/// Who wrote a narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    #[default]
    Service,
    Fallback,
}

/// A progress report for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressNarrative {
    pub title: String,
    pub summary: String,
    pub completion_rate: f64,
    #[serde(default)]
    pub insights: Vec<Insight>,
    pub motivational_message: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub source: NarrativeSource,
}

/// Every narrative backend implements this trait.
pub trait NarrativeService: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn generate_progress_narrative(
        &self,
        progress: &UserProgress,
    ) -> Result<ProgressNarrative, NarrativeError>;

    /// Two or three insights about a single habit.
    fn generate_habit_insights(&self, habit: &HabitSummary) -> Result<Vec<Insight>, NarrativeError>;
}

/// Service with deterministic fallback.
pub struct Narrator {
    service: Option<Box<dyn NarrativeService>>,
    fallback: FallbackNarrator,
}

impl Narrator {
    /// A narrator that only uses the fallback.
    pub fn offline() -> Self {
        Self {
            service: None,
            fallback: FallbackNarrator,
        }
    }

    pub fn with_service(service: Box<dyn NarrativeService>) -> Self {
        Self {
            service: Some(service),
            fallback: FallbackNarrator,
        }
    }

    /// Build from config: the HTTP service when enabled with an endpoint,
    /// otherwise offline.
    ///
    /// # Errors
    /// Returns an error if the endpoint is not a valid URL.
    pub fn from_config(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        match (&config.endpoint, config.enabled) {
            (Some(endpoint), true) => {
                let service = HttpNarrativeService::new(endpoint, config.timeout_secs)?;
                Ok(Self::with_service(Box::new(service)))
            }
            _ => Ok(Self::offline()),
        }
    }

    pub fn progress_narrative(&self, progress: &UserProgress) -> ProgressNarrative {
        if let Some(service) = &self.service {
            match service.generate_progress_narrative(progress) {
                Ok(narrative) => return narrative,
                Err(e) => warn!(
                    service = service.name(),
                    user_id = %progress.user_id,
                    error = %e,
                    "narrative service failed, using fallback"
                ),
            }
        }
        self.fallback.progress_report(progress)
    }

    pub fn habit_insights(&self, habit: &HabitSummary) -> Vec<Insight> {
        if let Some(service) = &self.service {
            match service.generate_habit_insights(habit) {
                Ok(insights) => return insights,
                Err(e) => warn!(
                    service = service.name(),
                    habit_id = %habit.habit_id,
                    error = %e,
                    "habit insight service failed, using fallback"
                ),
            }
        }
        self.fallback.insights_for(habit)
    }
}
