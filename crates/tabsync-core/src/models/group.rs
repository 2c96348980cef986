//! Portable tab-group record and the snapshot container

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use super::{SyncTab, GROUP_ID_NONE};

/// Provenance of a group record's most recent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    /// Existed locally only
    Created,
    /// Existed remotely only (pull-created)
    Updated,
    /// Existed on both sides
    Merged,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Merged => "merged",
        };
        write!(f, "{name}")
    }
}

/// A tab group as it appears in the sync snapshot.
///
/// `id` lives in the identifier space of whichever side produced the record:
/// remote storage carries the id the group was first synced under, local
/// browser state carries the host-assigned session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTabGroup {
    #[serde(deserialize_with = "deserialize_group_id")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(default)]
    pub tabs: Vec<SyncTab>,
    /// Set once at first observation, milliseconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Advances with every write that touches the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<SyncOperation>,
}

/// The persisted snapshot: group id (string key) to group record.
///
/// Keys are unique and insertion order is irrelevant; a sorted map keeps the
/// serialized form deterministic.
pub type SyncTabGroupsStorage = BTreeMap<String, SyncTabGroup>;

/// Snapshot keys and import payloads carry group ids as JSON numbers or
/// numeric strings interchangeably; accept both. A non-numeric string is a
/// sentinel, not malformed input: it lands on [`GROUP_ID_NONE`] and never
/// resolves to a match.
fn deserialize_group_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupIdVisitor;

    impl Visitor<'_> for GroupIdVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("an integer group id or a string")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(|_| E::custom("group id out of range"))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
            Ok(value.parse().unwrap_or(GROUP_ID_NONE))
        }
    }

    deserializer.deserialize_any(GroupIdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn group_id_accepts_number_and_numeric_string() {
        let from_number: SyncTabGroup = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        assert_eq!(from_number.id, 5);

        let from_string: SyncTabGroup = serde_json::from_str(r#"{"id": "12"}"#).unwrap();
        assert_eq!(from_string.id, 12);
    }

    #[test]
    fn non_numeric_group_id_becomes_ungrouped_sentinel() {
        let group: SyncTabGroup = serde_json::from_str(r#"{"id": "work"}"#).unwrap();
        assert_eq!(group.id, GROUP_ID_NONE);
    }

    #[test]
    fn operation_uses_lowercase_wire_form() {
        assert_eq!(
            serde_json::to_value(SyncOperation::Merged).unwrap(),
            serde_json::json!("merged")
        );
    }

    #[test]
    fn group_round_trips_camel_case_fields() {
        let json = serde_json::json!({
            "id": 5,
            "title": "Work",
            "color": "blue",
            "collapsed": false,
            "tabs": [{"url": "https://a", "title": "A"}],
            "createdAt": 100,
            "updatedAt": 200,
            "lastOperation": "created"
        });
        let group: SyncTabGroup = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(group.created_at, Some(100));
        assert_eq!(group.last_operation, Some(SyncOperation::Created));
        assert_eq!(serde_json::to_value(&group).unwrap(), json);
    }
}
