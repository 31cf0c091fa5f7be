//! Error taxonomy for the vault engine.
//!
//! Only [`VaultError::Configuration`] is fatal. Everything else is recovered at
//! the boundary of each public operation and turned into "no result" or a
//! diagnostic entry.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// A bracketed token that is not `[[target]]` or `[[target|alias]]`.
    #[error("`{0}` is an invalid link")]
    MalformedLink(String),

    /// The resolved note has neither a live buffer nor a file on disk.
    #[error("note not found: {}", .0.display())]
    NoteNotFound(PathBuf),

    /// The vault root has not been initialized yet. Transient; retry later.
    #[error("the vault is not initialized yet")]
    VaultNotReady,

    /// Zero or several vault roots, a missing root, or a symbolic link cycle.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The metadata block exists but is not a YAML mapping.
    #[error("invalid metadata block: {0}")]
    InvalidMetadata(String),
}

impl VaultError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, VaultError::Configuration(_))
    }
}

pub type Result<T, E = VaultError> = std::result::Result<T, E>;
