//! Snapshot codec: projections between host records and the portable sync
//! representation, plus JSON import/export framing.
//!
//! Everything here is pure; no host or storage calls.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::host::{GroupRecord, TabRecord};
use crate::models::{LocalGroupId, SyncOperation, SyncTab, SyncTabGroup, SyncTabGroupsStorage};

/// The updatable display properties of a group.
///
/// Structural fields (`id`, `groupId`, `windowId`, `tabs`) are not
/// representable here, so they can never leak into a group-property update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

impl GroupProperties {
    /// Display metadata of a portable group record.
    pub fn from_sync_group(group: &SyncTabGroup) -> Self {
        Self {
            title: group.title.clone(),
            color: group.color.clone(),
            collapsed: group.collapsed,
        }
    }

    /// Display metadata of a host group record.
    pub fn from_record(record: &GroupRecord) -> Self {
        Self {
            title: Some(record.title.clone()),
            color: Some(record.color.clone()),
            collapsed: Some(record.collapsed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.color.is_none() && self.collapsed.is_none()
    }
}

/// Project a host tab onto the portable shape, keeping stable fields only.
pub fn sync_tab_from_host(tab: &TabRecord) -> SyncTab {
    SyncTab::new(tab.url.clone(), tab.title.clone())
}

/// Build a portable group record from host state.
///
/// `group` is `None` when the host no longer knows the group; the record then
/// carries only the id, with all display metadata absent. `created_at` is
/// preserved from `existing` so first-observation time never changes;
/// `updated_at` is always the operation timestamp. Tabs sharing a url
/// collapse to the first occurrence: no group holds duplicate urls at rest.
pub fn sync_group_from_host(
    group_id: LocalGroupId,
    group: Option<&GroupRecord>,
    tabs: &[TabRecord],
    existing: Option<&SyncTabGroup>,
    operation: SyncOperation,
    now: i64,
) -> SyncTabGroup {
    let mut seen_urls = HashSet::new();
    SyncTabGroup {
        id: group.map_or(group_id, |record| record.id),
        title: group.map(|record| record.title.clone()),
        color: group.map(|record| record.color.clone()),
        collapsed: group.map(|record| record.collapsed),
        tabs: tabs
            .iter()
            .filter(|tab| seen_urls.insert(tab.url.as_str()))
            .map(sync_tab_from_host)
            .collect(),
        created_at: existing.and_then(|record| record.created_at).or(Some(now)),
        updated_at: Some(now),
        last_operation: Some(operation),
    }
}

/// A usable stored value is a non-empty JSON object.
pub fn is_non_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|object| !object.is_empty())
}

/// Validate and decode an import payload.
pub fn parse_import(payload: Value) -> Result<SyncTabGroupsStorage> {
    if !is_non_empty_object(&payload) {
        return Err(Error::InvalidData(
            "import payload must be a non-empty object".to_string(),
        ));
    }
    serde_json::from_value(payload)
        .map_err(|error| Error::InvalidData(format!("import payload failed to parse: {error}")))
}

/// Render the export file body: pretty-printed JSON, 2-space indent.
pub fn render_json_export(groups: &SyncTabGroupsStorage) -> serde_json::Result<String> {
    serde_json::to_string_pretty(groups)
}

/// Default export file name, `tabgroups-<YYYY-MM-DD-HHmmss>.json`.
pub fn export_file_name(timestamp: DateTime<Utc>) -> String {
    format!("tabgroups-{}.json", timestamp.format("%Y-%m-%d-%H%M%S"))
}
