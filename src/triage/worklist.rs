//! Worklist ranking — the filtered, sorted view of messages shown to the
//! operator.
//!
//! `rank` is a pure function: deterministic, side-effect-free, and stable
//! for equal keys, so re-invoking it with identical inputs yields identical
//! output (re-render stability).

use serde::{Deserialize, Serialize};

use crate::triage::types::{Message, MessageStatus};

/// Which status tab the worklist is filtered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorklistTab {
    /// No status filter.
    All,
    New,
    AutoReplied,
    NeedsReview,
    Done,
}

impl WorklistTab {
    /// The status this tab selects, or `None` for the All tab.
    pub fn status(&self) -> Option<MessageStatus> {
        match self {
            Self::All => None,
            Self::New => Some(MessageStatus::New),
            Self::AutoReplied => Some(MessageStatus::AutoReplied),
            Self::NeedsReview => Some(MessageStatus::NeedsReview),
            Self::Done => Some(MessageStatus::Done),
        }
    }
}

impl Default for WorklistTab {
    fn default() -> Self {
        Self::All
    }
}

impl std::str::FromStr for WorklistTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "new" => Ok(Self::New),
            "auto-replied" => Ok(Self::AutoReplied),
            "needs-review" => Ok(Self::NeedsReview),
            "done" => Ok(Self::Done),
            _ => Err(format!("Unknown worklist tab: {s}")),
        }
    }
}

/// Filter and order messages for display.
///
/// Filter: a message survives iff its tenant name, property label, category,
/// or body contains `search_text` case-insensitively, and its status matches
/// the active tab. Sort: priority rank ascending (high first), then a coarse
/// recency bucket from the timestamp string; ties keep input order.
pub fn rank(messages: &[Message], search_text: &str, tab: WorklistTab) -> Vec<Message> {
    let needle = search_text.to_lowercase();

    let mut ranked: Vec<Message> = messages
        .iter()
        .filter(|message| matches_search(message, &needle))
        .filter(|message| tab.status().is_none_or(|status| message.status == status))
        .cloned()
        .collect();

    // sort_by_key is stable: equal (priority, recency) pairs keep input order
    ranked.sort_by_key(|message| (message.priority.sort_rank(), recency_bucket(&message.timestamp)));
    ranked
}

fn matches_search(message: &Message, needle: &str) -> bool {
    message.tenant.name.to_lowercase().contains(needle)
        || message.property.to_lowercase().contains(needle)
        || message.category.to_lowercase().contains(needle)
        || message.body.to_lowercase().contains(needle)
}

/// Coarse recency from a display timestamp: "just now" < minutes < hours <
/// days < anything unrecognized.
fn recency_bucket(timestamp: &str) -> u8 {
    let lowered = timestamp.to_lowercase();
    if lowered.contains("just now") {
        0
    } else if lowered.contains("minute") {
        1
    } else if lowered.contains("hour") {
        2
    } else if lowered.contains("day") {
        3
    } else {
        4
    }
}
