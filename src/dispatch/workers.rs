//! Maintenance-worker finder — pure I/O adapter over the search read store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FeedError;

/// Worker options shown per dispatch session. The upstream store orders
/// candidates for us; we only cap the count.
pub const MAX_WORKER_OPTIONS: usize = 3;

/// One maintenance-worker candidate.
///
/// `name` is the natural key within a dispatch session — candidates are not
/// globally unique across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerOption {
    pub name: String,
    /// Worker type/specialty, e.g. "Plumber".
    #[serde(rename = "type")]
    pub specialty: String,
    /// Display-formatted rating, e.g. "4.8".
    pub rating: String,
    /// Drafted email for this worker, once generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_draft: Option<String>,
}

/// Looks up worker candidates for an issue's location.
#[async_trait]
pub trait WorkerFinder: Send + Sync {
    /// Return up to [`MAX_WORKER_OPTIONS`] candidates, upstream-ordered.
    async fn find_workers(&self, location: &str) -> Result<Vec<WorkerOption>, FeedError>;
}

/// Finder backed by the maintenance-search read store.
///
/// The store holds precomputed results ordered by recency, so the location
/// only narrates the lookup — the query itself is unparameterized.
pub struct HttpWorkerFinder {
    base_url: String,
    client: reqwest::Client,
}

impl HttpWorkerFinder {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/maintenance-results",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl WorkerFinder for HttpWorkerFinder {
    async fn find_workers(&self, location: &str) -> Result<Vec<WorkerOption>, FeedError> {
        info!(%location, "Searching for maintenance workers");

        let mut options: Vec<WorkerOption> = self
            .client
            .get(self.url())
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| FeedError::Unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| FeedError::Unavailable(format!("malformed worker response: {e}")))?;

        options.truncate(MAX_WORKER_OPTIONS);
        info!(count = options.len(), "Worker search complete");
        Ok(options)
    }
}
