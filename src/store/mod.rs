//! Message store — merged worklist state with broadcast to WS clients.
//!
//! Holds the locally-seeded messages plus the feed-derived items merged in
//! from the categorizer. Local items own their statuses; feed-derived items
//! are view-only annotations that get replaced wholesale on each merge and
//! are never written back to the feed's origin store.

pub mod seed;

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use crate::triage::types::{Message, MessageStatus};

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Store event fanned out to rendering clients.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// Full worklist snapshot — sent on connect and after a merge.
    MessagesSync { messages: Vec<Message> },
    /// A single message changed status.
    StatusChanged { id: String, status: MessageStatus },
}

/// In-memory message store backed by a broadcast channel for fan-out.
pub struct MessageStore {
    local: RwLock<Vec<Message>>,
    feed: RwLock<Vec<Message>>,
    tx: broadcast::Sender<StoreEvent>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            local: RwLock::new(Vec::new()),
            feed: RwLock::new(Vec::new()),
            tx,
        })
    }

    /// Create a store pre-populated with the seeded tenant messages.
    pub fn with_seed() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            local: RwLock::new(seed::seed_messages()),
            feed: RwLock::new(Vec::new()),
            tx,
        })
    }

    /// Subscribe to store events. Each WS client calls this.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// The merged, de-duplicated worklist: local items first (insertion
    /// order), then feed-derived items.
    pub async fn list(&self) -> Vec<Message> {
        let local = self.local.read().await;
        let feed = self.feed.read().await;
        local.iter().chain(feed.iter()).cloned().collect()
    }

    /// Replace the feed-derived portion of the worklist.
    ///
    /// Local messages and their statuses are untouched. Incoming items whose
    /// id collides with an existing message are dropped — id spaces are
    /// disjoint upstream, so a collision means a duplicate record.
    pub async fn merge_feed(&self, messages: Vec<Message>) {
        let merged = {
            let local = self.local.read().await;
            let mut feed = self.feed.write().await;

            let mut deduped: Vec<Message> = Vec::with_capacity(messages.len());
            for message in messages {
                let collides = local.iter().any(|m| m.id == message.id)
                    || deduped.iter().any(|m| m.id == message.id);
                if collides {
                    debug!(id = %message.id, "Dropping duplicate feed message");
                    continue;
                }
                deduped.push(message);
            }
            *feed = deduped;

            info!(count = feed.len(), "Merged categorizer feed into worklist");
            local.iter().chain(feed.iter()).cloned().collect()
        };

        let _ = self.tx.send(StoreEvent::MessagesSync { messages: merged });
    }

    /// Replace the status of the message with the given id.
    ///
    /// A missing id is a no-op, not an error. Returns the updated worklist
    /// either way.
    pub async fn set_status(&self, id: &str, status: MessageStatus) -> Vec<Message> {
        let mut changed = false;
        {
            let mut local = self.local.write().await;
            let mut feed = self.feed.write().await;
            if let Some(message) = local
                .iter_mut()
                .chain(feed.iter_mut())
                .find(|m| m.id == id)
            {
                message.status = status;
                changed = true;
            }
        }

        if changed {
            info!(id = %id, status = %status, "Message status updated");
            let _ = self.tx.send(StoreEvent::StatusChanged {
                id: id.to_string(),
                status,
            });
        } else {
            debug!(id = %id, "Status update for unknown message ignored");
        }

        self.list().await
    }

    /// Look up a message by id.
    ///
    /// Selection is independent of worklist filtering: a message filtered
    /// out of view stays addressable for the detail pane.
    pub async fn select(&self, id: &str) -> Option<Message> {
        let local = self.local.read().await;
        if let Some(message) = local.iter().find(|m| m.id == id) {
            return Some(message.clone());
        }
        let feed = self.feed.read().await;
        feed.iter().find(|m| m.id == id).cloned()
    }

    /// Number of messages in the merged worklist.
    pub async fn len(&self) -> usize {
        self.local.read().await.len() + self.feed.read().await.len()
    }

    /// Whether the merged worklist is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
