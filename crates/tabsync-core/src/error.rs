//! Error types for tabsync-core

use thiserror::Error;

/// Result type alias using tabsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tabsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, empty, or structurally invalid snapshot / import payload
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Storage scope read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Host tab/group capability failure
    #[error("Host error: {0}")]
    Host(String),

    /// Invalid argument shape passed to a capability primitive (caller bug)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
