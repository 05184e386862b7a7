//! Dispatch session state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::draft::IssueDetails;
use super::workers::WorkerOption;
use crate::error::DispatchError;
use crate::triage::types::Message;

/// Phase of a dispatch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPhase {
    /// No session in progress.
    Idle,
    /// Worker-location lookup is running.
    Searching,
    /// Worker options are visible for selection.
    Choosing,
    /// A worker was picked; an email draft is being generated or reviewed.
    Drafting,
    /// The issue was handled — message marked done.
    Resolved,
    /// The session was abandoned without resolving the message.
    Dismissed,
}

impl DispatchPhase {
    /// Check if this phase allows transitioning to another phase.
    pub fn can_transition_to(&self, target: DispatchPhase) -> bool {
        use DispatchPhase::*;

        matches!(
            (self, target),
            (Idle, Searching) |
            // Search completes (possibly with zero options) or is abandoned
            (Searching, Choosing) | (Searching, Dismissed) |
            // A worker is picked, everyone is dismissed, or the dialog closes
            (Choosing, Drafting) | (Choosing, Resolved) | (Choosing, Dismissed) |
            // Draft arrives (self-loop), gets sent, or the dialog closes
            (Drafting, Drafting) | (Drafting, Resolved) | (Drafting, Dismissed)
        )
    }

    /// Check if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }
}

impl std::fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Choosing => "choosing",
            Self::Drafting => "drafting",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        };
        write!(f, "{s}")
    }
}

/// Ephemeral state for one in-progress dispatch: candidate workers, the
/// chosen one, the generated draft, and phase markers.
///
/// Owned by the orchestrator for the duration of handling one selected
/// message and destroyed once a terminal phase is reached.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSession {
    /// Session identity — stale async completions are matched against this.
    pub id: Uuid,
    /// The message being dispatched.
    pub message_id: String,
    /// Issue fields passed to the drafting service.
    pub issue: IssueDetails,
    pub phase: DispatchPhase,
    /// Candidate workers, populated when the search completes.
    pub options: Vec<WorkerOption>,
    /// The picked worker, if any.
    pub chosen: Option<WorkerOption>,
    /// Current draft text. Regeneration replaces it; it is not versioned.
    pub draft: Option<String>,
    /// Why the last draft request failed, if it did.
    pub draft_error: Option<String>,
    /// Monotonically increasing draft-request counter; responses whose
    /// counter doesn't match the latest are discarded.
    #[serde(skip)]
    pub request_seq: u64,
    pub started_at: DateTime<Utc>,
}

impl DispatchSession {
    /// Open a session for a message, entering `Searching`.
    pub fn begin(message: &Message) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_id: message.id.clone(),
            issue: IssueDetails {
                description: message.body.clone(),
                urgency: message.priority.to_string(),
                location: message.property.clone(),
                tenant_name: message.tenant.name.clone(),
            },
            phase: DispatchPhase::Searching,
            options: Vec::new(),
            chosen: None,
            draft: None,
            draft_error: None,
            request_seq: 0,
            started_at: Utc::now(),
        }
    }

    /// Transition to a new phase, rejecting edges the machine doesn't have.
    pub fn transition_to(&mut self, target: DispatchPhase) -> Result<(), DispatchError> {
        if !self.phase.can_transition_to(target) {
            return Err(DispatchError::InvalidTransition {
                from: self.phase,
                to: target,
            });
        }
        tracing::debug!(
            session = %self.id,
            message = %self.message_id,
            from = %self.phase,
            to = %target,
            "Dispatch phase transition"
        );
        self.phase = target;
        Ok(())
    }

    /// Bump and return the draft-request counter.
    pub fn next_request_seq(&mut self) -> u64 {
        self.request_seq += 1;
        self.request_seq
    }
}
