//! Persistence boundary: two independent key-value scopes
//!
//! The "synced" scope holds the canonical snapshot and travels between
//! machines; the "local-only" scope holds the session mirror and the
//! identity mapping, which is machine-specific and must never be overwritten
//! by a remote sync.

pub mod file;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::is_non_empty_object;
use crate::error::Result;
use crate::mapping::GroupIdMapping;
use crate::models::SyncTabGroupsStorage;

pub use file::FileScope;
pub use memory::MemoryScope;

/// Storage key of the snapshot, present in both scopes.
pub const TAB_GROUPS_KEY: &str = "tabGroups";
/// Storage key of the identity mapping, local scope only.
pub const GROUP_ID_MAPPING_KEY: &str = "groupIdMapping";

/// One key-value storage scope.
#[async_trait]
pub trait StorageScope: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Typed access to the two scopes.
#[derive(Clone)]
pub struct StorageGateway {
    sync_scope: Arc<dyn StorageScope>,
    local_scope: Arc<dyn StorageScope>,
}

impl StorageGateway {
    pub fn new(sync_scope: Arc<dyn StorageScope>, local_scope: Arc<dyn StorageScope>) -> Self {
        Self {
            sync_scope,
            local_scope,
        }
    }

    /// Read the canonical snapshot from the synced scope.
    ///
    /// A missing or structurally invalid value is `Ok(None)`; callers decide
    /// whether that aborts the operation.
    pub async fn load_snapshot(&self) -> Result<Option<SyncTabGroupsStorage>> {
        let Some(value) = self.sync_scope.get(TAB_GROUPS_KEY).await? else {
            warn!("no tab-group snapshot in sync storage");
            return Ok(None);
        };
        if !is_non_empty_object(&value) {
            warn!("stored tab-group snapshot is not a non-empty object");
            return Ok(None);
        }
        match serde_json::from_value(value) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(error) => {
                warn!(%error, "stored tab-group snapshot failed to parse");
                Ok(None)
            }
        }
    }

    /// Write the snapshot wholesale to the synced scope and mirror it to the
    /// local scope.
    pub async fn save_snapshot(&self, snapshot: &SyncTabGroupsStorage) -> Result<()> {
        let value = serde_json::to_value(snapshot)?;
        self.sync_scope.set(TAB_GROUPS_KEY, value.clone()).await?;
        self.local_scope.set(TAB_GROUPS_KEY, value).await?;
        debug!(groups = snapshot.len(), "snapshot persisted to both scopes");
        Ok(())
    }

    /// Read the identity mapping from the local scope, defaulting to empty.
    pub async fn load_group_id_mapping(&self) -> Result<GroupIdMapping> {
        let value = self.local_scope.get(GROUP_ID_MAPPING_KEY).await?;
        Ok(value
            .map(|value| GroupIdMapping::from_value(&value))
            .unwrap_or_default())
    }

    /// Replace the persisted identity mapping.
    pub async fn save_group_id_mapping(&self, mapping: &GroupIdMapping) -> Result<()> {
        self.local_scope
            .set(GROUP_ID_MAPPING_KEY, mapping.to_value())
            .await?;
        debug!(entries = mapping.len(), "identity mapping persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn gateway() -> (StorageGateway, Arc<MemoryScope>, Arc<MemoryScope>) {
        let sync_scope = Arc::new(MemoryScope::default());
        let local_scope = Arc::new(MemoryScope::default());
        (
            StorageGateway::new(sync_scope.clone(), local_scope.clone()),
            sync_scope,
            local_scope,
        )
    }

    #[tokio::test]
    async fn load_snapshot_tolerates_missing_and_malformed_values() {
        let (gateway, sync_scope, _) = gateway();
        assert_eq!(gateway.load_snapshot().await.unwrap(), None);

        sync_scope.insert(TAB_GROUPS_KEY, json!({}));
        assert_eq!(gateway.load_snapshot().await.unwrap(), None);

        sync_scope.insert(TAB_GROUPS_KEY, json!("nonsense"));
        assert_eq!(gateway.load_snapshot().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_snapshot_writes_both_scopes() {
        let (gateway, sync_scope, local_scope) = gateway();
        let snapshot: SyncTabGroupsStorage =
            serde_json::from_value(json!({"5": {"id": 5, "tabs": []}})).unwrap();
        gateway.save_snapshot(&snapshot).await.unwrap();

        let stored = sync_scope.get(TAB_GROUPS_KEY).await.unwrap().unwrap();
        let mirrored = local_scope.get(TAB_GROUPS_KEY).await.unwrap().unwrap();
        assert_eq!(stored, mirrored);
        assert_eq!(gateway.load_snapshot().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn mapping_round_trips_through_local_scope_only() {
        let (gateway, sync_scope, local_scope) = gateway();
        let mut mapping = GroupIdMapping::new();
        mapping.insert(5, 12);
        gateway.save_group_id_mapping(&mapping).await.unwrap();

        assert!(sync_scope.get(GROUP_ID_MAPPING_KEY).await.unwrap().is_none());
        assert!(local_scope.get(GROUP_ID_MAPPING_KEY).await.unwrap().is_some());
        assert_eq!(gateway.load_group_id_mapping().await.unwrap(), mapping);
    }
}
