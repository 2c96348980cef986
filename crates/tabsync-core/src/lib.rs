//! tabsync-core - Core library for tabgroup-sync
//!
//! Reconciles a browser's locally grouped tabs with a remotely persisted
//! snapshot of tab groups: push (local→remote), pull (remote→local), merge
//! (bidirectional), and JSON import/export. The host's tab/group primitives
//! and the two storage scopes are capability traits supplied at startup.

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod mapping;
pub mod matcher;
pub mod models;
pub mod protocol;
pub mod storage;

pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::{Error, Result};
