//! Error types for Prop Assist.

use crate::dispatch::session::DispatchPhase;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },
}

/// Categorization-feed errors.
///
/// Both variants are recoverable: an unavailable feed degrades the worklist
/// to local-only, and a failed refresh leaves the worklist unchanged.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Categorizer feed unavailable: {0}")]
    Unavailable(String),

    #[error("Refresh failed: {reason}")]
    RefreshFailed { reason: String },
}

/// Email-draft service errors.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// The service answered but returned no usable draft text.
    #[error("No draft available")]
    Unavailable,

    #[error("Draft request failed: {reason}")]
    RequestFailed { reason: String },
}

/// Dispatch orchestration errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Message {id} not found")]
    UnknownMessage { id: String },

    #[error("Cannot dispatch for category {category}: only maintenance issues are dispatchable")]
    NotMaintenance { category: String },

    #[error("A dispatch session is already in progress")]
    SessionActive,

    #[error("No dispatch session is active")]
    NoSession,

    #[error("Cannot {action} while session is {phase}")]
    InvalidPhase {
        phase: DispatchPhase,
        action: &'static str,
    },

    #[error("No worker option named {name}")]
    UnknownWorker { name: String },

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: DispatchPhase,
        to: DispatchPhase,
    },

    /// The session was dismissed while an async step was in flight.
    /// A normal terminal outcome, surfaced so callers drop the stale result.
    #[error("Dispatch session was dismissed mid-flight")]
    Aborted,
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
