//! Message triage — worklist types, ranking, and the categorization feed.

pub mod feed;
pub mod types;
pub mod worklist;
