//! Narrative service over HTTP: POSTs the rollup as JSON, reads the report back.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::{Insight, NarrativeService, NarrativeSource, ProgressNarrative};
use crate::error::NarrativeError;
use crate::rollup::{HabitSummary, UserProgress};

pub struct HttpNarrativeService {
    base: Url,
    timeout_secs: u64,
    client: Client,
}

impl HttpNarrativeService {
    /// `endpoint` is the service base URL; reports go to `progress-narrative`
    /// and habit insights to `habit-insights` below it.
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, NarrativeError> {
        let mut base = Url::parse(endpoint)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base,
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Blocking POST on a private current-thread runtime. Must not be called
    /// from inside another Tokio runtime.
    fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, NarrativeError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.base.join(path)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(NarrativeError::Runtime)?;

        runtime.block_on(async {
            let resp = self
                .client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| self.classify(e))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(NarrativeError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            resp.json::<T>().await.map_err(|e| self.classify(e))
        })
    }

    fn classify(&self, err: reqwest::Error) -> NarrativeError {
        if err.is_timeout() {
            NarrativeError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            NarrativeError::Request(err)
        }
    }
}

impl NarrativeService for HttpNarrativeService {
    fn name(&self) -> &str {
        "http"
    }

    fn generate_progress_narrative(
        &self,
        progress: &UserProgress,
    ) -> Result<ProgressNarrative, NarrativeError> {
        let mut narrative: ProgressNarrative = self.post_json("progress-narrative", progress)?;
        narrative.source = NarrativeSource::Service;
        Ok(narrative)
    }

    fn generate_habit_insights(&self, habit: &HabitSummary) -> Result<Vec<Insight>, NarrativeError> {
        self.post_json("habit-insights", habit)
    }
}
