//! In-memory host adapter
//!
//! Deterministic [`TabHost`] implementation over a serializable state, used
//! by integration tests and by the CLI harness (which round-trips the state
//! through a JSON file). Ids are assigned sequentially, like a host session.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GroupQuery, GroupRecord, GroupTabsRequest, TabHost, TabQuery, TabRecord};
use crate::codec::GroupProperties;
use crate::error::{Error, Result};
use crate::models::{LocalGroupId, GROUP_ID_NONE};

/// Complete browser-side state of the in-memory host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostState {
    pub tabs: Vec<TabRecord>,
    pub groups: Vec<GroupRecord>,
    pub next_tab_id: i64,
    pub next_group_id: i64,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            tabs: Vec::new(),
            groups: Vec::new(),
            next_tab_id: 1,
            next_group_id: 1,
        }
    }
}

pub struct MemoryHost {
    state: Mutex<HostState>,
}

impl MemoryHost {
    /// Build a host over the given state. Id counters are advanced past any
    /// ids already present so hand-written state files cannot collide.
    pub fn new(mut state: HostState) -> Self {
        let max_tab_id = state.tabs.iter().map(|tab| tab.id).max().unwrap_or(0);
        let max_group_id = state.groups.iter().map(|group| group.id).max().unwrap_or(0);
        state.next_tab_id = state.next_tab_id.max(max_tab_id + 1);
        state.next_group_id = state.next_group_id.max(max_group_id + 1);
        Self {
            state: Mutex::new(state),
        }
    }

    /// Snapshot of the current state, for persistence or assertions.
    pub fn state(&self) -> HostState {
        self.state.lock().clone()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(HostState::default())
    }
}

fn apply_properties(group: &mut GroupRecord, properties: &GroupProperties) {
    if let Some(title) = &properties.title {
        group.title.clone_from(title);
    }
    if let Some(color) = &properties.color {
        group.color.clone_from(color);
    }
    if let Some(collapsed) = properties.collapsed {
        group.collapsed = collapsed;
    }
}

#[async_trait]
impl TabHost for MemoryHost {
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabRecord>> {
        let state = self.state.lock();
        Ok(state
            .tabs
            .iter()
            .filter(|tab| query.pinned.is_none_or(|pinned| tab.pinned == pinned))
            .filter(|tab| query.group_id.is_none_or(|group_id| tab.group_id == group_id))
            .cloned()
            .collect())
    }

    async fn query_groups(&self, query: &GroupQuery) -> Result<Vec<GroupRecord>> {
        let state = self.state.lock();
        Ok(state
            .groups
            .iter()
            .filter(|group| {
                query
                    .window_id
                    .is_none_or(|window_id| group.window_id == window_id)
            })
            .filter(|group| {
                query
                    .title
                    .as_deref()
                    .is_none_or(|title| group.title == title)
            })
            .cloned()
            .collect())
    }

    async fn get_group(&self, group_id: LocalGroupId) -> Result<Option<GroupRecord>> {
        let state = self.state.lock();
        Ok(state.groups.iter().find(|group| group.id == group_id).cloned())
    }

    async fn create_tab(&self, url: &str) -> Result<TabRecord> {
        let mut state = self.state.lock();
        let tab = TabRecord {
            id: state.next_tab_id,
            url: url.to_string(),
            title: url.to_string(),
            group_id: GROUP_ID_NONE,
            last_accessed: None,
            pinned: false,
        };
        state.next_tab_id += 1;
        state.tabs.push(tab.clone());
        debug!(id = tab.id, url, "created tab");
        Ok(tab)
    }

    async fn group_tabs(&self, request: &GroupTabsRequest) -> Result<LocalGroupId> {
        if request.tab_ids.is_empty() {
            return Err(Error::InvalidInput(
                "group_tabs requires a non-empty set of tab ids".to_string(),
            ));
        }

        let mut state = self.state.lock();
        for tab_id in &request.tab_ids {
            if !state.tabs.iter().any(|tab| tab.id == *tab_id) {
                return Err(Error::InvalidInput(format!("unknown tab id {tab_id}")));
            }
        }

        let group_id = match request.group_id {
            Some(group_id) => {
                if !state.groups.iter().any(|group| group.id == group_id) {
                    return Err(Error::Host(format!("group {group_id} not found")));
                }
                group_id
            }
            None => {
                let group_id = state.next_group_id;
                state.next_group_id += 1;
                state.groups.push(GroupRecord {
                    id: group_id,
                    title: String::new(),
                    color: "grey".to_string(),
                    collapsed: false,
                    window_id: 1,
                });
                group_id
            }
        };

        for tab in &mut state.tabs {
            if request.tab_ids.contains(&tab.id) {
                tab.group_id = group_id;
            }
        }

        if let Some(properties) = &request.properties {
            if let Some(group) = state.groups.iter_mut().find(|group| group.id == group_id) {
                apply_properties(group, properties);
            }
        }

        debug!(group_id, tabs = request.tab_ids.len(), "grouped tabs");
        Ok(group_id)
    }

    async fn update_group(
        &self,
        group_id: LocalGroupId,
        properties: &GroupProperties,
    ) -> Result<GroupRecord> {
        let mut state = self.state.lock();
        let group = state
            .groups
            .iter_mut()
            .find(|group| group.id == group_id)
            .ok_or_else(|| Error::Host(format!("group {group_id} not found")))?;
        apply_properties(group, properties);
        Ok(group.clone())
    }
}
