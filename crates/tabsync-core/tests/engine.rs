//! End-to-end reconciliation scenarios against the in-memory host and scopes.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use tabsync_core::host::{GroupRecord, HostState, MemoryHost, TabRecord};
use tabsync_core::models::{SyncOperation, GROUP_ID_NONE};
use tabsync_core::protocol::{self, Request, Response};
use tabsync_core::storage::{
    MemoryScope, StorageGateway, StorageScope, GROUP_ID_MAPPING_KEY, TAB_GROUPS_KEY,
};
use tabsync_core::{SyncConfig, SyncEngine};

struct Fixture {
    engine: SyncEngine,
    host: Arc<MemoryHost>,
    sync_scope: Arc<MemoryScope>,
    local_scope: Arc<MemoryScope>,
}

fn fixture(state: HostState) -> Fixture {
    let host = Arc::new(MemoryHost::new(state));
    let sync_scope = Arc::new(MemoryScope::new());
    let local_scope = Arc::new(MemoryScope::new());
    let engine = SyncEngine::new(
        host.clone(),
        StorageGateway::new(sync_scope.clone(), local_scope.clone()),
        SyncConfig::default(),
    );
    Fixture {
        engine,
        host,
        sync_scope,
        local_scope,
    }
}

fn tab(id: i64, url: &str, group_id: i64) -> TabRecord {
    TabRecord {
        id,
        url: url.to_string(),
        title: format!("Tab {id}"),
        group_id,
        last_accessed: None,
        pinned: false,
    }
}

fn group(id: i64, title: &str) -> GroupRecord {
    GroupRecord {
        id,
        title: title.to_string(),
        color: "blue".to_string(),
        collapsed: false,
        window_id: 1,
    }
}

// --------------------------------------------------------------------------
// Pull
// --------------------------------------------------------------------------

#[tokio::test]
async fn pull_adopts_existing_ungrouped_tab_and_records_mapping() {
    let fx = fixture(HostState {
        tabs: vec![tab(1, "https://a", GROUP_ID_NONE)],
        ..HostState::default()
    });
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"5": {"id": 5, "title": "Work", "tabs": [{"url": "https://a", "title": "A"}]}}),
    );

    fx.engine.pull().await.unwrap();

    let state = fx.host.state();
    // No new tab was created; the existing one was annexed.
    assert_eq!(state.tabs.len(), 1);
    assert_eq!(state.groups.len(), 1);
    let new_group = &state.groups[0];
    assert_eq!(new_group.title, "Work");
    assert_eq!(state.tabs[0].group_id, new_group.id);
    assert_ne!(new_group.id, 5);

    // Remote id 5 now maps to the freshly assigned local id.
    let mapping = fx.local_scope.get(GROUP_ID_MAPPING_KEY).await.unwrap().unwrap();
    assert_eq!(mapping, json!({"5": new_group.id}));
}

#[tokio::test]
async fn pull_never_moves_a_grouped_tab() {
    let fx = fixture(HostState {
        tabs: vec![tab(1, "https://a", 2)],
        groups: vec![group(2, "Mine")],
        ..HostState::default()
    });
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"5": {"id": 5, "title": "Work", "tabs": [{"url": "https://a", "title": "A"}]}}),
    );

    fx.engine.pull().await.unwrap();

    let state = fx.host.state();
    assert_eq!(state.tabs[0].group_id, 2);
    // No tabs were queueable, so no group was created either.
    assert_eq!(state.groups.len(), 1);
}

#[tokio::test]
async fn pull_creates_missing_tabs_and_carries_remote_metadata() {
    let fx = fixture(HostState::default());
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"5": {
            "id": 5,
            "title": "Work",
            "color": "red",
            "collapsed": true,
            "tabs": [
                {"url": "https://a", "title": "A"},
                {"url": "https://b", "title": "B"}
            ]
        }}),
    );

    fx.engine.pull().await.unwrap();

    let state = fx.host.state();
    assert_eq!(state.tabs.len(), 2);
    assert_eq!(state.groups.len(), 1);
    let created = &state.groups[0];
    assert_eq!(created.title, "Work");
    assert_eq!(created.color, "red");
    assert!(created.collapsed);
    assert!(state.tabs.iter().all(|t| t.group_id == created.id));
}

#[tokio::test]
async fn pull_extends_group_resolved_through_saved_mapping() {
    let fx = fixture(HostState {
        tabs: vec![tab(1, "https://a", 12), tab(2, "https://b", GROUP_ID_NONE)],
        groups: vec![group(12, "Renamed locally")],
        ..HostState::default()
    });
    fx.local_scope.insert(GROUP_ID_MAPPING_KEY, json!({"5": 12}));
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"5": {"id": 5, "title": "Work", "tabs": [
            {"url": "https://a", "title": "A"},
            {"url": "https://b", "title": "B"}
        ]}}),
    );

    fx.engine.pull().await.unwrap();

    let state = fx.host.state();
    // The ungrouped tab joined group 12 instead of forming a new group.
    assert_eq!(state.groups.len(), 1);
    assert_eq!(state.tabs[1].group_id, 12);
}

#[tokio::test]
async fn pull_materializes_groups_under_non_numeric_keys_without_mapping() {
    let fx = fixture(HostState::default());
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"work": {
            "id": "work",
            "title": "Work",
            "tabs": [{"url": "https://a", "title": "A"}]
        }}),
    );

    fx.engine.pull().await.unwrap();

    let state = fx.host.state();
    assert_eq!(state.tabs.len(), 1);
    assert_eq!(state.groups.len(), 1);
    assert_eq!(state.groups[0].title, "Work");
    assert_eq!(state.tabs[0].group_id, state.groups[0].id);

    // No remote id to record, so the mapping stays empty.
    let mapping = fx.local_scope.get(GROUP_ID_MAPPING_KEY).await.unwrap().unwrap();
    assert_eq!(mapping, json!({}));
}

#[tokio::test]
async fn pull_without_usable_snapshot_is_a_structured_failure() {
    let fx = fixture(HostState::default());

    let response = protocol::handle(&fx.engine, Request::Pull).await;
    match response {
        Response::Status { success, error } => {
            assert!(!success);
            assert!(error.unwrap().contains("Invalid data"));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

// --------------------------------------------------------------------------
// Push
// --------------------------------------------------------------------------

#[tokio::test]
async fn push_twice_is_idempotent_apart_from_provenance_and_updated_at() {
    let fx = fixture(HostState {
        tabs: vec![
            tab(1, "https://a", 3),
            tab(2, "https://b", 3),
            tab(3, "https://c", GROUP_ID_NONE),
        ],
        groups: vec![group(3, "Work")],
        ..HostState::default()
    });

    let first = fx.engine.push().await.unwrap();
    let second = fx.engine.push().await.unwrap();

    assert_eq!(first.len(), 1);
    let before = &first["3"];
    let after = &second["3"];
    assert_eq!(before.last_operation, Some(SyncOperation::Created));
    assert_eq!(after.last_operation, Some(SyncOperation::Merged));
    assert_eq!(before.created_at, after.created_at);
    assert_eq!(before.id, after.id);
    assert_eq!(before.title, after.title);
    assert_eq!(before.color, after.color);
    assert_eq!(before.tabs, after.tabs);
    // The ungrouped tab never entered the snapshot.
    assert_eq!(after.tabs.len(), 2);
}

#[tokio::test]
async fn push_keys_groups_by_their_remote_identity() {
    let fx = fixture(HostState {
        tabs: vec![tab(1, "https://a", 12)],
        groups: vec![group(12, "Work")],
        ..HostState::default()
    });
    fx.local_scope.insert(GROUP_ID_MAPPING_KEY, json!({"5": 12}));

    let snapshot = fx.engine.push().await.unwrap();

    assert!(snapshot.contains_key("5"));
    assert!(!snapshot.contains_key("12"));
    // The record itself still carries the local id it was built from.
    assert_eq!(snapshot["5"].id, 12);
}

#[tokio::test]
async fn push_degrades_to_placeholder_for_deleted_group() {
    let fx = fixture(HostState {
        tabs: vec![tab(1, "https://a", 9)],
        groups: vec![],
        ..HostState::default()
    });

    let snapshot = fx.engine.push().await.unwrap();

    let placeholder = &snapshot["9"];
    assert_eq!(placeholder.id, 9);
    assert_eq!(placeholder.title, None);
    assert_eq!(placeholder.color, None);
    assert_eq!(placeholder.tabs.len(), 1);
}

// --------------------------------------------------------------------------
// Merge
// --------------------------------------------------------------------------

#[tokio::test]
async fn merge_unions_without_duplicating_urls() {
    let fx = fixture(HostState {
        tabs: vec![
            tab(1, "https://a", 1),
            tab(2, "https://b", GROUP_ID_NONE),
        ],
        groups: vec![group(1, "Work")],
        ..HostState::default()
    });
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"5": {"id": 5, "title": "Work", "tabs": [
            {"url": "https://a", "title": "A"},
            {"url": "https://b", "title": "B"}
        ]}}),
    );

    let merged = fx.engine.merge().await.unwrap();

    // Remote group folded into the local one; single entry, keyed locally.
    assert_eq!(merged.len(), 1);
    let entry = &merged["1"];
    let urls: Vec<&str> = entry.tabs.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a", "https://b"]);

    // Merge builds the synced representation only; no host mutations.
    let state = fx.host.state();
    assert_eq!(state.tabs[1].group_id, GROUP_ID_NONE);
}

#[tokio::test]
async fn merge_collapses_repeated_urls_within_a_local_group() {
    let fx = fixture(HostState {
        tabs: vec![tab(1, "https://a", 1), tab(2, "https://a", 1)],
        groups: vec![group(1, "Work")],
        ..HostState::default()
    });
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"1": {"id": 1, "title": "Work", "tabs": [{"url": "https://a", "title": "A"}]}}),
    );

    let merged = fx.engine.merge().await.unwrap();

    assert_eq!(merged.len(), 1);
    assert_eq!(merged["1"].tabs.len(), 1);
    assert_eq!(merged["1"].tabs[0].url, "https://a");
}

#[tokio::test]
async fn merge_preserves_local_grouping_of_conflicting_tabs() {
    let fx = fixture(HostState {
        tabs: vec![tab(1, "https://a", 2)],
        groups: vec![group(2, "Mine")],
        ..HostState::default()
    });
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"9": {"id": 9, "title": "Theirs", "tabs": [{"url": "https://a", "title": "A"}]}}),
    );

    let merged = fx.engine.merge().await.unwrap();

    // The tab stays recorded under the local group; the remote group ends up
    // empty and is pruned.
    assert_eq!(merged.len(), 1);
    assert!(merged.contains_key("2"));
    assert!(!merged.contains_key("9"));
    assert_eq!(merged["2"].last_operation, Some(SyncOperation::Created));
}

#[tokio::test]
async fn merge_keeps_remote_only_groups_as_updated() {
    let fx = fixture(HostState {
        tabs: vec![tab(1, "https://a", 1)],
        groups: vec![group(1, "Work")],
        ..HostState::default()
    });
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({
            "1": {"id": 1, "title": "Work", "tabs": [{"url": "https://a", "title": "A"}]},
            "9": {
                "id": 9,
                "title": "News",
                "tabs": [{"url": "https://n", "title": "N"}],
                "createdAt": 111,
                "updatedAt": 222
            }
        }),
    );

    let merged = fx.engine.merge().await.unwrap();

    assert_eq!(merged.len(), 2);
    assert_eq!(merged["1"].last_operation, Some(SyncOperation::Merged));
    let news = &merged["9"];
    assert_eq!(news.last_operation, Some(SyncOperation::Updated));
    assert_eq!(news.created_at, Some(111));
    assert_eq!(news.updated_at, Some(222));
    assert_eq!(news.tabs.len(), 1);
}

// --------------------------------------------------------------------------
// Import / export
// --------------------------------------------------------------------------

#[tokio::test]
async fn import_wins_on_key_collision_and_materializes_groups() {
    let fx = fixture(HostState::default());
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({"9": {"id": 9, "tabs": [{"url": "https://old", "title": "Old"}], "createdAt": 50}}),
    );

    fx.engine
        .import(json!({"9": {"id": 9, "tabs": [{"url": "https://x", "title": "X"}]}}))
        .await
        .unwrap();

    let stored = fx.engine.groups_for_export().await.unwrap();
    assert_eq!(stored.len(), 1);
    let imported = &stored[0];
    assert_eq!(imported.tabs.len(), 1);
    assert_eq!(imported.tabs[0].url, "https://x");
    assert_eq!(imported.last_operation, Some(SyncOperation::Created));
    assert!(imported.created_at.is_some());

    // The trailing pull created the tab and group locally.
    let state = fx.host.state();
    assert_eq!(state.tabs.len(), 1);
    assert_eq!(state.tabs[0].url, "https://x");
    assert_eq!(state.groups.len(), 1);
    assert_eq!(state.tabs[0].group_id, state.groups[0].id);
}

#[tokio::test]
async fn import_rejects_empty_payload_without_touching_storage() {
    let fx = fixture(HostState::default());

    let response = protocol::handle(&fx.engine, Request::ImportJson { data: json!({}) }).await;
    assert_eq!(
        serde_json::to_value(&response).unwrap()["success"],
        json!(false)
    );
    assert!(fx.sync_scope.get(TAB_GROUPS_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn export_selected_returns_exactly_the_requested_keys() {
    let fx = fixture(HostState::default());
    fx.sync_scope.insert(
        TAB_GROUPS_KEY,
        json!({
            "1": {"id": 1, "tabs": [{"url": "https://a"}]},
            "2": {"id": 2, "tabs": [{"url": "https://b"}]},
            "3": {"id": 3, "tabs": [{"url": "https://c"}]}
        }),
    );

    let response = protocol::handle(
        &fx.engine,
        Request::ExportJson {
            selected_ids: vec![1, 3],
        },
    )
    .await;

    let Response::Data { data } = response else {
        panic!("expected data response");
    };
    let keys: Vec<&str> = data.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["1", "3"]);
}

// --------------------------------------------------------------------------
// Round trip
// --------------------------------------------------------------------------

#[tokio::test]
async fn push_then_pull_on_fresh_profile_recreates_groups_and_maps_ids() {
    // Machine A: two grouped tabs, push.
    let machine_a = fixture(HostState {
        tabs: vec![tab(1, "https://a", 7), tab(2, "https://b", 7)],
        groups: vec![group(7, "Work")],
        ..HostState::default()
    });
    let snapshot = machine_a.engine.push().await.unwrap();

    // Machine B: empty profile sharing the sync scope.
    let machine_b = fixture(HostState::default());
    machine_b
        .sync_scope
        .insert(TAB_GROUPS_KEY, serde_json::to_value(&snapshot).unwrap());

    machine_b.engine.pull().await.unwrap();

    let state = machine_b.host.state();
    assert_eq!(state.tabs.len(), 2);
    assert_eq!(state.groups.len(), 1);
    assert_eq!(state.groups[0].title, "Work");

    // Local id differs from the pushed key, so the mapping records it; a
    // second pull is a no-op thanks to that mapping.
    machine_b.engine.pull().await.unwrap();
    let state = machine_b.host.state();
    assert_eq!(state.tabs.len(), 2);
    assert_eq!(state.groups.len(), 1);
}
