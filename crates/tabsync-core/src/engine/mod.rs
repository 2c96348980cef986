//! Reconciliation engine: push, pull, merge, and import orchestration
//!
//! Each operation runs as one sequential chain of awaited capability calls;
//! between any two suspension points the in-memory working state is
//! consistent. There is no rollback: a failure partway leaves completed host
//! mutations in place, and re-running is safe because the matcher recognizes
//! already-migrated tabs and groups.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::codec::{parse_import, sync_group_from_host, GroupProperties};
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::host::{GroupQuery, GroupRecord, GroupTabsRequest, TabHost, TabQuery, TabRecord};
use crate::mapping::GroupIdMapping;
use crate::matcher::find_existing_group_id;
use crate::models::{
    is_valid_group_id, LocalGroupId, SyncOperation, SyncTab, SyncTabGroup, SyncTabGroupsStorage,
};
use crate::storage::StorageGateway;

/// Current local browser state, queried once per operation.
struct TabContext {
    /// Tab lookup by URL; later tabs win on duplicate URLs.
    tab_map: HashMap<String, TabRecord>,
    /// Per-group tab membership, keyed by local group id.
    tabs_by_group: HashMap<LocalGroupId, Vec<TabRecord>>,
    groups: Vec<GroupRecord>,
}

pub struct SyncEngine {
    host: Arc<dyn TabHost>,
    storage: StorageGateway,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(host: Arc<dyn TabHost>, storage: StorageGateway, config: SyncConfig) -> Self {
        Self {
            host,
            storage,
            config,
        }
    }

    fn tab_query(&self) -> TabQuery {
        TabQuery {
            pinned: if self.config.include_pinned {
                None
            } else {
                Some(false)
            },
            ..TabQuery::default()
        }
    }

    async fn tab_context(&self) -> Result<TabContext> {
        let tabs = self.host.query_tabs(&self.tab_query()).await?;
        let mut tab_map = HashMap::new();
        let mut tabs_by_group: HashMap<LocalGroupId, Vec<TabRecord>> = HashMap::new();
        for tab in tabs {
            tabs_by_group
                .entry(tab.group_id)
                .or_default()
                .push(tab.clone());
            tab_map.insert(tab.url.clone(), tab);
        }
        let groups = self.host.query_groups(&GroupQuery::default()).await?;
        Ok(TabContext {
            tab_map,
            tabs_by_group,
            groups,
        })
    }

    /// Load the identity mapping and drop entries whose local group no
    /// longer exists; the host recycles ids across sessions.
    async fn load_validated_mapping(&self, groups: &[GroupRecord]) -> Result<GroupIdMapping> {
        let mut mapping = self.storage.load_group_id_mapping().await?;
        mapping.retain_live(groups);
        Ok(mapping)
    }

    /// Push local state to storage: one snapshot entry per local group, keyed
    /// by its remote identity (reverse-lookup through the mapping, defaulting
    /// to the local id when unmapped). Replaces the stored snapshot wholesale.
    pub async fn push(&self) -> Result<SyncTabGroupsStorage> {
        let tabs = self.host.query_tabs(&self.tab_query()).await?;
        let groups = self.host.query_groups(&GroupQuery::default()).await?;
        let mapping = self.load_validated_mapping(&groups).await?;
        let existing = self.storage.load_snapshot().await?.unwrap_or_default();

        // One timestamp for everything this pass writes.
        let now = Utc::now().timestamp_millis();
        let mut snapshot = SyncTabGroupsStorage::new();

        for tab in &tabs {
            if !is_valid_group_id(tab.group_id) {
                continue;
            }
            let local_id = tab.group_id;
            let remote_id = mapping.reverse_lookup(local_id).unwrap_or(local_id);
            let key = remote_id.to_string();
            if snapshot.contains_key(&key) {
                continue;
            }

            let group = self.host.get_group(local_id).await?;
            if group.is_none() {
                warn!(group_id = local_id, "group missing from host, pushing bare placeholder");
            }
            let group_tabs: Vec<TabRecord> = tabs
                .iter()
                .filter(|other| other.group_id == local_id)
                .cloned()
                .collect();

            let prior = existing.get(&key);
            let operation = if prior.is_some() {
                SyncOperation::Merged
            } else {
                SyncOperation::Created
            };
            debug!(local_id, remote_id, ?operation, "pushing group");
            snapshot.insert(
                key,
                sync_group_from_host(local_id, group.as_ref(), &group_tabs, prior, operation, now),
            );
        }

        self.storage.save_snapshot(&snapshot).await?;
        info!(groups = snapshot.len(), "pushed local tab groups to storage");
        Ok(snapshot)
    }

    /// Pull the stored snapshot into the browser. Fails fast when no usable
    /// snapshot exists.
    pub async fn pull(&self) -> Result<()> {
        let Some(snapshot) = self.storage.load_snapshot().await? else {
            return Err(Error::InvalidData(
                "no usable tab-group snapshot in sync storage".to_string(),
            ));
        };
        self.pull_core(&snapshot).await
    }

    /// Materialize remote groups as local tabs and groups.
    ///
    /// For each remote tab: an existing ungrouped tab with the same URL is
    /// annexed; an already-grouped one is left where it is; a missing one is
    /// created first. Queued tabs extend the matched group or form a new one
    /// carrying the remote display metadata. Mapping entries recorded for
    /// one group are visible to matching for the groups after it.
    pub async fn pull_core(&self, snapshot: &SyncTabGroupsStorage) -> Result<()> {
        let mut context = self.tab_context().await?;
        let mut mapping = self.load_validated_mapping(&context.groups).await?;

        for (key, group) in snapshot {
            // A non-numeric key still names a real group; only the identity
            // mapping degrades, since there is no remote id to record.
            let remote_id = match key.parse::<i64>() {
                Ok(remote_id) => Some(remote_id),
                Err(_) => {
                    warn!(%key, "snapshot key is not numeric, no identity mapping will be recorded");
                    None
                }
            };

            let existing_id = find_existing_group_id(
                group,
                &context.groups,
                &context.tabs_by_group,
                Some(&mapping),
                &self.config.default_group_title,
            );
            debug!(%key, ?existing_id, "resolved remote group against local state");

            let mut tab_ids = Vec::new();
            for tab in &group.tabs {
                match context.tab_map.get(&tab.url) {
                    Some(existing_tab) if is_valid_group_id(existing_tab.group_id) => {
                        // Never reassign a tab out of its current group.
                        debug!(
                            url = %tab.url,
                            group_id = existing_tab.group_id,
                            "tab already grouped, leaving in place"
                        );
                    }
                    Some(existing_tab) => {
                        tab_ids.push(existing_tab.id);
                    }
                    None => {
                        let new_tab = self.host.create_tab(&tab.url).await?;
                        debug!(url = %tab.url, id = new_tab.id, "created missing tab");
                        tab_ids.push(new_tab.id);
                        context.tab_map.insert(tab.url.clone(), new_tab);
                    }
                }
            }

            if tab_ids.is_empty() {
                continue;
            }

            let local_id = match existing_id {
                Some(existing_id) => {
                    debug!(group_id = existing_id, tabs = tab_ids.len(), "extending existing group");
                    self.host
                        .group_tabs(&GroupTabsRequest {
                            tab_ids,
                            group_id: Some(existing_id),
                            properties: None,
                        })
                        .await?
                }
                None => {
                    let properties = GroupProperties::from_sync_group(group);
                    self.host
                        .group_tabs(&GroupTabsRequest {
                            tab_ids,
                            group_id: None,
                            properties: (!properties.is_empty()).then_some(properties),
                        })
                        .await?
                }
            };

            if let Some(remote_id) = remote_id {
                if local_id != remote_id {
                    mapping.insert(remote_id, local_id);
                    debug!(remote_id, local_id, "recorded identity mapping");
                }
            }
        }

        self.storage.save_group_id_mapping(&mapping).await?;
        info!(groups = snapshot.len(), "pulled tab groups from storage");
        Ok(())
    }

    /// Symmetric union of the stored snapshot and local state.
    ///
    /// Builds the merged synced representation only; no host mutations. A
    /// subsequent pull materializes whatever the merge added.
    pub async fn merge(&self) -> Result<SyncTabGroupsStorage> {
        let Some(remote) = self.storage.load_snapshot().await? else {
            return Err(Error::InvalidData(
                "no usable tab-group snapshot in sync storage".to_string(),
            ));
        };
        let context = self.tab_context().await?;
        let mapping = self.load_validated_mapping(&context.groups).await?;

        let now = Utc::now().timestamp_millis();
        let mut merged = SyncTabGroupsStorage::new();
        let mut captured_urls: HashSet<String> = HashSet::new();

        // Seed with every local group.
        for local_group in &context.groups {
            if !is_valid_group_id(local_group.id) {
                continue;
            }
            let group_tabs = context
                .tabs_by_group
                .get(&local_group.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let key = local_group.id.to_string();
            let prior = remote.get(&key);
            let operation = if prior.is_some() {
                SyncOperation::Merged
            } else {
                SyncOperation::Created
            };
            let entry = sync_group_from_host(
                local_group.id,
                Some(local_group),
                group_tabs,
                prior,
                operation,
                now,
            );
            for tab in &entry.tabs {
                captured_urls.insert(tab.url.clone());
            }
            merged.insert(key, entry);
        }

        // Fold in remote groups.
        for (key, remote_group) in &remote {
            let existing_id = find_existing_group_id(
                remote_group,
                &context.groups,
                &context.tabs_by_group,
                Some(&mapping),
                &self.config.default_group_title,
            );

            let target_key = match existing_id {
                Some(existing_id) => {
                    debug!(%key, group_id = existing_id, "merging remote group into local one");
                    existing_id.to_string()
                }
                None => {
                    // Local side doesn't have it: keep the remote identity
                    // and timestamps, mark as pull-created.
                    debug!(%key, "remote group has no local counterpart");
                    merged.insert(
                        key.clone(),
                        SyncTabGroup {
                            id: remote_group.id,
                            title: remote_group.title.clone(),
                            color: remote_group.color.clone(),
                            collapsed: remote_group.collapsed,
                            tabs: Vec::new(),
                            created_at: remote_group.created_at.or(Some(now)),
                            updated_at: remote_group.updated_at.or(Some(now)),
                            last_operation: Some(SyncOperation::Updated),
                        },
                    );
                    key.clone()
                }
            };

            for remote_tab in &remote_group.tabs {
                if captured_urls.contains(&remote_tab.url) {
                    continue;
                }
                let Some(entry) = merged.get_mut(&target_key) else {
                    break;
                };
                match context.tab_map.get(&remote_tab.url) {
                    Some(local_tab) if is_valid_group_id(local_tab.group_id) => {
                        // Grouped locally under some other group: the local
                        // arrangement wins, skip silently.
                        debug!(
                            url = %remote_tab.url,
                            group_id = local_tab.group_id,
                            "skipping remote tab grouped locally"
                        );
                    }
                    Some(local_tab) => {
                        let title = if remote_tab.title.is_empty() {
                            local_tab.title.clone()
                        } else {
                            remote_tab.title.clone()
                        };
                        entry.tabs.push(SyncTab::new(remote_tab.url.clone(), title));
                        captured_urls.insert(remote_tab.url.clone());
                    }
                    None => {
                        entry
                            .tabs
                            .push(SyncTab::new(remote_tab.url.clone(), remote_tab.title.clone()));
                        captured_urls.insert(remote_tab.url.clone());
                    }
                }
            }

            if merged
                .get(&target_key)
                .is_some_and(|entry| entry.tabs.is_empty())
            {
                merged.remove(&target_key);
                debug!(key = %target_key, "dropping empty group from merge result");
            }
        }

        self.storage.save_snapshot(&merged).await?;
        info!(groups = merged.len(), "merged remote and local tab groups");
        Ok(merged)
    }

    /// Import a JSON payload into storage, imported entries winning on key
    /// collision, then immediately pull so the imported groups materialize.
    pub async fn import(&self, payload: serde_json::Value) -> Result<()> {
        let imported = parse_import(payload)?;
        let mut merged = self.storage.load_snapshot().await?.unwrap_or_default();

        let now = Utc::now().timestamp_millis();
        for (key, mut group) in imported {
            group.created_at = group.created_at.or(Some(now));
            group.updated_at = Some(now);
            group.last_operation = Some(SyncOperation::Created);
            merged.insert(key, group);
        }

        self.storage.save_snapshot(&merged).await?;
        info!(groups = merged.len(), "imported tab groups into storage");
        self.pull_core(&merged).await
    }

    /// The stored snapshot as-is; empty when missing or unusable.
    pub async fn snapshot(&self) -> Result<SyncTabGroupsStorage> {
        Ok(self.storage.load_snapshot().await?.unwrap_or_default())
    }

    /// Groups available for export; empty when no usable snapshot exists.
    pub async fn groups_for_export(&self) -> Result<Vec<SyncTabGroup>> {
        Ok(self.snapshot().await?.into_values().collect())
    }

    /// Subset of the stored snapshot keyed by the selected group ids.
    pub async fn export_selected(&self, selected_ids: &[i64]) -> Result<SyncTabGroupsStorage> {
        let snapshot = self.snapshot().await?;
        let mut selection = SyncTabGroupsStorage::new();
        for id in selected_ids {
            let key = id.to_string();
            if let Some(group) = snapshot.get(&key) {
                selection.insert(key, group.clone());
            }
        }
        Ok(selection)
    }
}
