//! Portable tab record

use serde::{Deserialize, Serialize};

/// A tab as it appears in the sync snapshot.
///
/// The identity key for reconciliation is `url`, not an opaque id: two tabs
/// with the same URL are the same tab, even across machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTab {
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Last access time, milliseconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<i64>,
    /// Group the tab belonged to on the side that produced the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
}

impl SyncTab {
    /// Minimal record carrying only the stable identity fields.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            last_accessed: None,
            group_id: None,
        }
    }
}
