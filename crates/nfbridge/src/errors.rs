use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while bringing the native module into the process
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Invalid native module identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Native module '{identifier}' not found: {reason}")]
    NotFound { identifier: String, reason: String },

    /// The platform linker search failed; the linker does not say whether
    /// no file matched or a matching file could not be mapped
    #[error("Native module '{identifier}' could not be loaded by the platform linker: {reason}")]
    SearchFailed { identifier: String, reason: String },

    #[error("Failed to load native module '{identifier}' from {}: {reason}", .path.display())]
    LoadFailed {
        identifier: String,
        path: PathBuf,
        reason: String,
    },
}

impl LoadError {
    pub fn identifier(&self) -> &str {
        match self {
            LoadError::InvalidIdentifier(identifier)
            | LoadError::NotFound { identifier, .. }
            | LoadError::SearchFailed { identifier, .. }
            | LoadError::LoadFailed { identifier, .. } => identifier,
        }
    }
}

/// The module loaded but its entry symbol could not be bound
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Entry symbol '{symbol}' not found in native module '{module}': {reason}")]
pub struct SymbolResolutionError {
    pub module: String,
    pub symbol: String,
    pub reason: String,
}

/// Errors surfaced to the host by the bootstrap bridge
///
/// Every variant is a fatal startup failure; the bridge never retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    SymbolResolution(#[from] SymbolResolutionError),

    #[error("Entry point '{symbol}' in native module '{module}' panicked: {message}")]
    EntryPanicked {
        module: String,
        symbol: String,
        message: String,
    },

    #[error("Native bootstrap already failed: {0}")]
    PreviouslyFailed(String),
}
