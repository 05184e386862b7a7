//! Categorization feed adapter — pulls previously computed categorizer
//! records and maps them into worklist messages.
//!
//! The feed is a read-only collaborator: records are mapped at read time and
//! never persisted back. A fetch failure is recoverable — callers keep the
//! local messages and render a non-blocking notice instead of failing the
//! whole view.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::FeedError;
use crate::triage::types::{CategorizerRecord, Message, MessageStatus, Priority, Tenant};

/// Timestamp marker for feed-derived messages. Records carry a creation
/// instant for ordering, but the worklist shows display strings.
pub const JUST_NOW_TIMESTAMP: &str = "Just now";

/// Property label for feed-derived messages — the categorizer doesn't know
/// which unit a record belongs to.
const FEED_PROPERTY_LABEL: &str = "System Message";

/// Placeholder tenant attached to feed-derived messages until the
/// categorizer starts carrying sender identity.
const FEED_TENANT_NAME: &str = "Sarah Smith";

/// Pull-based access to the categorizer system.
#[async_trait]
pub trait CategorizationFeed: Send + Sync {
    /// Fetch the current categorizer records, mapped into messages.
    async fn fetch(&self) -> Result<Vec<Message>, FeedError>;

    /// Ask the source system to recompute its records. Does not return the
    /// records themselves — follow with `fetch`.
    async fn trigger_refresh(&self) -> Result<(), FeedError>;
}

/// Map one categorizer record into a worklist message.
///
/// Status is fixed to `New`, the timestamp becomes the "just now" marker,
/// and urgency is clamped onto the priority scale.
pub fn map_record(record: CategorizerRecord) -> Message {
    Message {
        id: record.id,
        tenant: Tenant::named(FEED_TENANT_NAME),
        property: FEED_PROPERTY_LABEL.to_string(),
        category: record.flag,
        body: record.message_content,
        timestamp: JUST_NOW_TIMESTAMP.to_string(),
        status: MessageStatus::New,
        priority: Priority::from_urgency(&record.urgency),
    }
}

// ── HTTP implementation ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Feed adapter talking to the categorizer read store over HTTP.
pub struct HttpCategorizationFeed {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCategorizationFeed {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CategorizationFeed for HttpCategorizationFeed {
    async fn fetch(&self) -> Result<Vec<Message>, FeedError> {
        let records: Vec<CategorizerRecord> = self
            .client
            .get(self.url("categorizer-results"))
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| FeedError::Unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| FeedError::Unavailable(format!("malformed feed response: {e}")))?;

        info!(count = records.len(), "Fetched categorizer records");
        Ok(records.into_iter().map(map_record).collect())
    }

    async fn trigger_refresh(&self) -> Result<(), FeedError> {
        let response: RefreshResponse = self
            .client
            .post(self.url("refresh"))
            .send()
            .await
            .map_err(|e| FeedError::RefreshFailed {
                reason: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| FeedError::RefreshFailed {
                reason: format!("malformed refresh response: {e}"),
            })?;

        if response.status != "success" {
            let reason = response
                .message
                .unwrap_or_else(|| format!("source reported status {}", response.status));
            warn!(%reason, "Categorizer refresh failed");
            return Err(FeedError::RefreshFailed { reason });
        }

        info!("Categorizer refresh triggered");
        Ok(())
    }
}
