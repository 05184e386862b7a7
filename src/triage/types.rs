//! Shared types for the tenant-message worklist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Priority ────────────────────────────────────────────────────────

/// Message priority, derived locally or from the categorizer's urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Ordinal used as the primary worklist sort key (high sorts first).
    pub fn sort_rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    /// Map a categorizer urgency value onto a priority.
    ///
    /// Unknown values clamp to `Low` rather than propagating upstream
    /// vocabulary into the worklist.
    pub fn from_urgency(urgency: &str) -> Self {
        match urgency.to_lowercase().as_str() {
            "high" => Self::High,
            "intermediate" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

// ── Status ──────────────────────────────────────────────────────────

/// Lifecycle status of a message.
///
/// Messages are never deleted — handling a message means marking it `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageStatus {
    /// Freshly arrived, nobody has looked at it.
    New,
    /// An automated reply was already sent.
    AutoReplied,
    /// A suggested reply is waiting for operator review.
    NeedsReview,
    /// Handled — resolved, dispatched, or dismissed.
    Done,
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::AutoReplied => "auto-replied",
            Self::NeedsReview => "needs-review",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "auto-replied" => Ok(Self::AutoReplied),
            "needs-review" => Ok(Self::NeedsReview),
            "done" => Ok(Self::Done),
            _ => Err(format!("Unknown message status: {s}")),
        }
    }
}

// ── Message ─────────────────────────────────────────────────────────

/// The tenant a message came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
    pub initials: String,
    /// Avatar URL, if the tenant has one on file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Tenant {
    /// Build a tenant with initials derived from the name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let initials = derive_initials(&name);
        Self {
            name,
            initials,
            avatar: None,
        }
    }
}

/// First letter of the first two words, uppercased.
fn derive_initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// One tenant communication requiring action.
///
/// Created by seed data or by mapping a categorizer record at read time;
/// mutated only by status replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique across the merged worklist — seed and feed-derived items
    /// use disjoint id spaces.
    pub id: String,
    pub tenant: Tenant,
    /// Property/unit label, e.g. "Sunset Apartments, #302".
    pub property: String,
    /// Free-text category, e.g. "Maintenance", "Rent", "Noise Complaint".
    pub category: String,
    /// Message body text.
    pub body: String,
    /// Display string ("10 minutes ago"), not a strict instant.
    pub timestamp: String,
    pub status: MessageStatus,
    pub priority: Priority,
}

impl Message {
    /// Whether this message can enter the maintenance-dispatch flow.
    pub fn is_maintenance(&self) -> bool {
        self.category.eq_ignore_ascii_case("maintenance")
    }
}

// ── Categorizer record ──────────────────────────────────────────────

/// A previously computed record from the external categorizer feed.
///
/// `urgency` stays a raw string on the wire; `Priority::from_urgency`
/// clamps it when the record is mapped into a `Message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizerRecord {
    pub id: String,
    pub message_content: String,
    /// Categorizer flag — becomes the message category verbatim.
    pub flag: String,
    pub urgency: String,
    /// Used for feed ordering, never displayed.
    pub created_at: DateTime<Utc>,
}
