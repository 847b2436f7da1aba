use serde::{Deserialize, Serialize};

/// One OKR node (objective or key result) in the remote hierarchy.
///
/// Produced by the normalizer from the raw GraphQL payload; no downstream
/// component ever sees the raw shape. Date fields keep the source format
/// verbatim — they are warehouse columns, not values this layer interprets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique stable identifier, e.g. `TEAM-123`. Primary key within a run.
    pub key: String,
    /// Display title.
    pub name: String,
    /// Free-text person name; `"Unknown"` when the remote record has none.
    pub owner_name: String,
    /// Declared parent, `None` for a forest root. May reference a goal that
    /// was never fetched; unresolved references are legal.
    pub parent_key: Option<String>,
    /// Sub-goal keys as declared by the remote source, in source order.
    /// The traversal's only source of edges to follow.
    pub child_keys: Vec<String>,
    pub tags: Vec<String>,
    pub teams: Vec<String>,
    /// How progress is measured (e.g. `ATTACHED_METRIC`, `NONE`); may be empty.
    pub progress_type: String,
    pub target_date: String,
    pub start_date: String,
    pub creation_date: String,
    /// Custom-field-derived grouping string, defaulting to `key`.
    pub lineage: String,
    /// Archived goals stay in the collected set but are excluded from snapshots.
    pub archived: bool,
}

impl Goal {
    /// Minimal goal with defaults for everything but the key. Used by the
    /// normalizer as the starting point and by tests as a fixture base.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            lineage: key.clone(),
            key,
            name: String::new(),
            owner_name: String::new(),
            parent_key: None,
            child_keys: Vec::new(),
            tags: Vec::new(),
            teams: Vec::new(),
            progress_type: String::new(),
            target_date: String::new(),
            start_date: String::new(),
            creation_date: String::new(),
            archived: false,
        }
    }
}
