//! Command implementations and the shared execution context.

pub mod export;
pub mod groups;
pub mod import;
pub mod sync_ops;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tabsync_core::host::{HostState, MemoryHost};
use tabsync_core::storage::{FileScope, StorageGateway};
use tabsync_core::{SyncConfig, SyncEngine};

use crate::error::CliError;

/// Engine wired to file-backed scopes and a browser state file loaded into
/// the in-memory host.
pub struct CliContext {
    pub engine: SyncEngine,
    host: Arc<MemoryHost>,
    browser_path: PathBuf,
}

impl CliContext {
    pub fn open(store: &Path, browser: &Path) -> Result<Self, CliError> {
        std::fs::create_dir_all(store)?;

        let state = match std::fs::read_to_string(browser) {
            Ok(raw) => serde_json::from_str::<HostState>(&raw).map_err(|error| {
                CliError::InvalidBrowserState(browser.display().to_string(), error.to_string())
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HostState::default(),
            Err(error) => return Err(error.into()),
        };

        let host = Arc::new(MemoryHost::new(state));
        let gateway = StorageGateway::new(
            Arc::new(FileScope::new(store.join("sync.json"))),
            Arc::new(FileScope::new(store.join("local.json"))),
        );
        let engine = SyncEngine::new(host.clone(), gateway, SyncConfig::default());

        Ok(Self {
            engine,
            host,
            browser_path: browser.to_path_buf(),
        })
    }

    /// Write the possibly mutated browser state back to its file.
    pub fn flush(&self) -> Result<(), CliError> {
        let rendered = serde_json::to_string_pretty(&self.host.state())?;
        std::fs::write(&self.browser_path, rendered + "\n")?;
        Ok(())
    }
}
