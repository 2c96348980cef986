//! Host tab/group capability boundary
//!
//! The engine talks to exactly one [`TabHost`] adapter chosen at startup and
//! never branches on which host backs it. All mutating calls are awaited
//! sequentially by the engine so the working state stays consistent between
//! suspension points.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::codec::GroupProperties;
use crate::error::Result;
use crate::models::{LocalGroupId, GROUP_ID_NONE};

pub use memory::{HostState, MemoryHost};

/// A tab as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// [`GROUP_ID_NONE`] when the tab belongs to no group
    #[serde(default = "ungrouped")]
    pub group_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<i64>,
    #[serde(default)]
    pub pinned: bool,
}

/// A group as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub window_id: i64,
}

fn ungrouped() -> i64 {
    GROUP_ID_NONE
}

/// Tab query filter. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabQuery {
    pub pinned: Option<bool>,
    pub group_id: Option<i64>,
}

/// Group query filter. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupQuery {
    pub window_id: Option<i64>,
    pub title: Option<String>,
}

/// Request to fold a set of tabs into a group.
///
/// `group_id: Some` extends an existing group; `None` creates a new one,
/// optionally applying display `properties` to it afterwards. An empty
/// `tab_ids` set is a contract violation and fails with
/// [`Error::InvalidInput`](crate::Error::InvalidInput).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTabsRequest {
    pub tab_ids: Vec<i64>,
    pub group_id: Option<LocalGroupId>,
    pub properties: Option<GroupProperties>,
}

/// Capability interface over the host's tab and group primitives.
///
/// One adapter is resolved at process start; the reconciliation engine only
/// ever sees this trait.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Tabs matching the filter, in host order.
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabRecord>>;

    /// Groups matching the filter, in host order.
    async fn query_groups(&self, query: &GroupQuery) -> Result<Vec<GroupRecord>>;

    /// Single group lookup; a deleted or unknown id is `Ok(None)`, not an
    /// error, so callers can degrade to a placeholder.
    async fn get_group(&self, group_id: LocalGroupId) -> Result<Option<GroupRecord>>;

    /// Open a new ungrouped tab at the given URL.
    async fn create_tab(&self, url: &str) -> Result<TabRecord>;

    /// Fold tabs into a new or existing group; returns the group's id.
    async fn group_tabs(&self, request: &GroupTabsRequest) -> Result<LocalGroupId>;

    /// Update a group's display properties.
    async fn update_group(
        &self,
        group_id: LocalGroupId,
        properties: &GroupProperties,
    ) -> Result<GroupRecord>;
}
