//! Error types for the timer engine.
//!
//! None of these escape an engine operation: persistence and alert failures
//! are logged and absorbed where they happen. Only lock poisoning reaches the
//! HTTP layer.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the durable key-value store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing a slot file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A collection could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Slot keys become file names, so path separators are refused
    #[error("Invalid slot key: {0:?}")]
    InvalidKey(String),

    /// Store unavailable (used by fakes and poisoned in-memory stores)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the audible or desktop alert surface.
#[derive(Error, Debug)]
pub enum AlertError {
    /// The configured sound file does not exist
    #[error("Alert sound not found at {0}")]
    MissingResource(PathBuf),

    /// Playback needs a tokio runtime to drive the player process
    #[error("No async runtime available for alert playback")]
    NoRuntime,

    /// The player or notifier process could not be spawned
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the shared engine state.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A previous holder of the engine lock panicked
    #[error("Failed to lock timer engine: {0}")]
    LockPoisoned(String),
}
