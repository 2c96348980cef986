//! Engine configuration

use serde::{Deserialize, Serialize};

/// Configuration injected into the reconciliation engine at construction.
///
/// Resolved once at startup and passed down; nothing in the engine consults
/// ambient or global state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Title substituted when a group carries none, used for title matching.
    pub default_group_title: String,
    /// Include pinned tabs in host queries. Off by default: pinned tabs are
    /// a per-machine arrangement and are left out of sync entirely.
    pub include_pinned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_exclude_pinned_and_use_empty_title() {
        let config = SyncConfig::default();
        assert_eq!(config.default_group_title, "");
        assert!(!config.include_pinned);
    }

    #[test]
    fn deserializes_from_partial_object() {
        let config: SyncConfig = serde_json::from_str(r#"{"includePinned": true}"#).unwrap();
        assert!(config.include_pinned);
        assert_eq!(config.default_group_title, "");
    }
}
