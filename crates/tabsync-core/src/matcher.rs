//! Group matcher: decides whether a candidate group already exists locally
//!
//! Resolution order, first success wins:
//! 1. direct id match against the existing groups
//! 2. mapped id match through the identity mapping (when supplied)
//! 3. unique title match
//! 4. shared-tab membership among same-titled groups
//! 5. no match — the caller creates a new group

use std::collections::HashMap;

use crate::host::{GroupRecord, TabRecord};
use crate::mapping::GroupIdMapping;
use crate::models::{is_valid_group_id, LocalGroupId, SyncTabGroup};

/// Resolve the candidate to an existing local group id, or `None` when a new
/// group should be created.
///
/// `tabs_by_group` is the current per-group tab membership, keyed by local
/// group id. `default_title` substitutes for an absent or empty candidate
/// title before title comparison.
pub fn find_existing_group_id(
    candidate: &SyncTabGroup,
    existing_groups: &[GroupRecord],
    tabs_by_group: &HashMap<LocalGroupId, Vec<TabRecord>>,
    mapping: Option<&GroupIdMapping>,
    default_title: &str,
) -> Option<LocalGroupId> {
    // 1. The candidate's id names an existing group outright.
    if let Some(group) = existing_groups.iter().find(|group| group.id == candidate.id) {
        if is_valid_group_id(group.id) {
            return Some(group.id);
        }
    }

    // 2. Translate the id as a remote id through the mapping.
    if let Some(mapping) = mapping {
        if let Some(local_id) = mapping.get(candidate.id) {
            if is_valid_group_id(local_id)
                && existing_groups.iter().any(|group| group.id == local_id)
            {
                return Some(local_id);
            }
        }
    }

    let title = candidate
        .title
        .as_deref()
        .filter(|title| !title.is_empty())
        .unwrap_or(default_title);
    let same_title: Vec<&GroupRecord> = existing_groups
        .iter()
        .filter(|group| group.title == title)
        .collect();

    // 3. Exactly one group carries the title.
    if same_title.len() == 1 {
        if is_valid_group_id(same_title[0].id) {
            return Some(same_title[0].id);
        }
    } else if same_title.len() > 1 && !candidate.tabs.is_empty() {
        // 4. Several groups share the title: first one holding any of the
        // candidate's URLs wins. Disjoint tab sets fall through to None.
        for group in same_title {
            let member_tabs = tabs_by_group
                .get(&group.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for tab in member_tabs {
                if candidate
                    .tabs
                    .iter()
                    .any(|candidate_tab| candidate_tab.url == tab.url)
                {
                    return Some(group.id);
                }
            }
        }
    }

    None
}
