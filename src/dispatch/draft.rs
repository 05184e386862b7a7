//! Email-draft service adapter.
//!
//! Two wire contracts against the drafting service:
//! - `POST /email-draft` at worker-selection time — a missing draft falls
//!   back to plain selection, it is not an error.
//! - `POST /draft-email` for regeneration — a missing draft is the
//!   recoverable "no draft available" condition, retryable by the operator.
//!
//! Transport failures on the regenerate path are retried a bounded number of
//! times with linear backoff. A response that parses but carries no usable
//! text is never retried automatically — that is the operator's call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::workers::WorkerOption;
use crate::error::DraftError;

/// The issue fields the drafting service needs.
#[derive(Debug, Clone, Serialize)]
pub struct IssueDetails {
    pub description: String,
    pub urgency: String,
    pub location: String,
    pub tenant_name: String,
}

/// Drafts an email asking a chosen worker to handle an issue.
#[async_trait]
pub trait DraftService: Send + Sync {
    /// Draft at selection time. `Ok(None)` means the service answered
    /// without a draft — proceed with the bare selection.
    async fn draft_for_selection(
        &self,
        worker: &WorkerOption,
        issue: &IssueDetails,
    ) -> Result<Option<String>, DraftError>;

    /// Request (or re-request) a draft. Regeneration re-issues the identical
    /// request; the caller replaces the prior draft with the result.
    async fn request_draft(
        &self,
        worker: &WorkerOption,
        issue: &IssueDetails,
    ) -> Result<String, DraftError>;
}

// ── HTTP implementation ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DraftResponse {
    #[serde(default)]
    email_draft: Option<String>,
}

impl DraftResponse {
    /// Usable draft text, if any. Whitespace-only drafts count as absent.
    fn text(self) -> Option<String> {
        self.email_draft.filter(|text| !text.trim().is_empty())
    }
}

/// Draft adapter talking to the drafting service over HTTP.
pub struct HttpDraftService {
    base_url: String,
    client: reqwest::Client,
    /// Additional attempts after a failed request (0 = no retry).
    max_retries: u32,
    /// Base backoff, multiplied by the attempt number.
    retry_backoff: Duration,
}

impl HttpDraftService {
    pub fn new(
        base_url: impl Into<String>,
        client: reqwest::Client,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            max_retries,
            retry_backoff,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// POST a body, retrying transport failures with linear backoff.
    async fn post_with_retry(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<DraftResponse, DraftError> {
        let mut attempt = 0;
        loop {
            match self.post_once(path, body).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = self.retry_backoff * attempt;
                    warn!(
                        error = %e,
                        attempt,
                        max = self.max_retries,
                        "Draft request failed, retrying after {backoff:?}"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<DraftResponse, DraftError> {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| DraftError::RequestFailed {
                reason: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| DraftError::RequestFailed {
                reason: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| DraftError::RequestFailed {
                reason: format!("malformed draft response: {e}"),
            })
    }
}

#[async_trait]
impl DraftService for HttpDraftService {
    async fn draft_for_selection(
        &self,
        worker: &WorkerOption,
        issue: &IssueDetails,
    ) -> Result<Option<String>, DraftError> {
        let body = serde_json::json!({
            "selected_worker": worker,
            "issue_details": {
                "description": issue.description,
                "urgency": issue.urgency,
                "location": issue.location,
                "tenantName": issue.tenant_name,
            },
        });

        let response = self.post_with_retry("email-draft", &body).await?;
        let text = response.text();
        if text.is_none() {
            debug!(worker = %worker.name, "No draft in selection response, proceeding without one");
        }
        Ok(text)
    }

    async fn request_draft(
        &self,
        worker: &WorkerOption,
        issue: &IssueDetails,
    ) -> Result<String, DraftError> {
        let body = serde_json::json!({
            "worker_info": {
                "name": worker.name,
                "rating": worker.rating,
            },
            "issue_details": {
                "description": issue.description,
                "tenant_name": issue.tenant_name,
                "location": issue.location,
            },
        });

        let response = self.post_with_retry("draft-email", &body).await?;
        let text = response.text().ok_or(DraftError::Unavailable)?;
        info!(worker = %worker.name, chars = text.len(), "Draft generated");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_with_text_is_usable() {
        let response: DraftResponse =
            serde_json::from_str(r#"{"email_draft": "Dear John, ..."}"#).unwrap();
        assert_eq!(response.text().as_deref(), Some("Dear John, ..."));
    }

    #[test]
    fn missing_or_blank_draft_is_absent() {
        let missing: DraftResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.text().is_none());

        let blank: DraftResponse = serde_json::from_str(r#"{"email_draft": "  "}"#).unwrap();
        assert!(blank.text().is_none());
    }

    #[test]
    fn selection_body_uses_camel_case_tenant_name() {
        // The /email-draft contract spells it tenantName; /draft-email
        // uses tenant_name
        let issue = IssueDetails {
            description: "Leaking ceiling".into(),
            urgency: "high".into(),
            location: "Lakeside Villas, #203".into(),
            tenant_name: "David Kim".into(),
        };
        let body = serde_json::json!({
            "issue_details": {
                "description": issue.description,
                "urgency": issue.urgency,
                "location": issue.location,
                "tenantName": issue.tenant_name,
            },
        });
        assert!(body["issue_details"].get("tenantName").is_some());
        assert!(body["issue_details"].get("tenant_name").is_none());
    }
}
