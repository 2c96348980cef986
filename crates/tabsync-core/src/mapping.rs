//! Identity mapping between remote and local group ids
//!
//! Local group ids are assigned by the host per browser session and are not
//! portable; the remote id (or the original local id that first got synced)
//! is the durable handle. This mapping is the only persistent bridge between
//! the two identifier spaces. It lives in the local-only storage scope so a
//! remote sync can never overwrite it.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::host::GroupRecord;
use crate::models::{LocalGroupId, RemoteGroupId};

/// Persistent remote-id → local-id association.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIdMapping(BTreeMap<RemoteGroupId, LocalGroupId>);

impl GroupIdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the wire form: a JSON object of string-encoded integer keys.
    /// Malformed keys or values are dropped, not errors.
    pub fn from_value(value: &Value) -> Self {
        let mut entries = BTreeMap::new();
        if let Value::Object(object) = value {
            for (key, value) in object {
                let Ok(remote_id) = key.parse::<i64>() else {
                    warn!(%key, "dropping mapping entry with non-numeric remote id");
                    continue;
                };
                let local_id = value
                    .as_i64()
                    .or_else(|| value.as_str().and_then(|raw| raw.parse().ok()));
                let Some(local_id) = local_id else {
                    warn!(%key, "dropping mapping entry with non-numeric local id");
                    continue;
                };
                entries.insert(remote_id, local_id);
            }
        }
        Self(entries)
    }

    /// Wire form used by the local storage scope.
    pub fn to_value(&self) -> Value {
        let mut object = serde_json::Map::new();
        for (remote_id, local_id) in &self.0 {
            object.insert(remote_id.to_string(), Value::from(*local_id));
        }
        Value::Object(object)
    }

    pub fn get(&self, remote_id: RemoteGroupId) -> Option<LocalGroupId> {
        self.0.get(&remote_id).copied()
    }

    pub fn insert(&mut self, remote_id: RemoteGroupId, local_id: LocalGroupId) {
        self.0.insert(remote_id, local_id);
    }

    /// Find a remote id whose mapped local id equals the given value.
    ///
    /// First match in ascending remote-id order. Multiple remote ids mapping
    /// to one local id is a tolerated last-write-wins ambiguity.
    pub fn reverse_lookup(&self, local_id: LocalGroupId) -> Option<RemoteGroupId> {
        self.0
            .iter()
            .find(|(_, mapped)| **mapped == local_id)
            .map(|(remote_id, _)| *remote_id)
    }

    /// Drop entries whose local id names no currently existing group.
    ///
    /// The host recycles numeric ids across sessions; a stale entry could
    /// otherwise match an unrelated group later. Returns the number of
    /// entries removed.
    pub fn retain_live(&mut self, groups: &[GroupRecord]) -> usize {
        let before = self.0.len();
        self.0
            .retain(|_, local_id| groups.iter().any(|group| group.id == *local_id));
        let dropped = before - self.0.len();
        if dropped > 0 {
            warn!(dropped, "pruned identity-mapping entries for missing groups");
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
