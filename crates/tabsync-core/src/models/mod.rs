//! Portable data model shared by sync storage, import/export, and the engine

mod group;
mod tab;

pub use group::{SyncOperation, SyncTabGroup, SyncTabGroupsStorage};
pub use tab::SyncTab;

/// Local group identifier, assigned by the host for the current session only.
pub type LocalGroupId = i64;

/// Remote group identifier, durable across sessions and machines.
pub type RemoteGroupId = i64;

/// Sentinel the host uses for tabs that belong to no group.
pub const GROUP_ID_NONE: i64 = -1;

/// A valid group id is strictly positive; zero, negative, or absent values
/// mean "not grouped" and never resolve to a match.
pub fn is_valid_group_id(group_id: i64) -> bool {
    group_id > 0
}
