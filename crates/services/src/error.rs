//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::{StorageError, StoreScopeError};
use storage::sqlite::SqliteInitError;

/// Errors emitted while asking a provider for a problem.
///
/// The game loop never surfaces these to the player; they trigger the
/// category's fallback problem instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("problem generation is not configured")]
    Disabled,
    #[error("problem generator is unavailable: {0}")]
    Unavailable(String),
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("model returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("only finished games can be recorded")]
    GameNotOver,
    #[error(transparent)]
    Scope(#[from] StoreScopeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("stored progress is unreadable: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
