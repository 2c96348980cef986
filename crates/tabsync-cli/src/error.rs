use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tabsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Browser state file {0} is not valid: {1}")]
    InvalidBrowserState(String, String),
    #[error("Nothing to export: the snapshot has no matching groups")]
    EmptyExport,
}
