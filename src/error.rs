use thiserror::Error;

/// Failures crossing the backing-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique-constraint or state conflict, e.g. a duplicate punch for the
    /// same employee, kind and day, or deleting a referenced department.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("row not found")]
    NotFound,

    /// Store unreachable; resync keeps the previous snapshot and retries.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the engine. Only `ReferenceNotFound`, `Validation`
/// and `Conflict` reach callers as request failures; sync and write-through
/// problems are logged and self-heal on the next resync.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{kind} {id} not found")]
    ReferenceNotFound { kind: &'static str, id: u64 },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => EngineError::Conflict(msg),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    pub fn not_found(kind: &'static str, id: u64) -> Self {
        EngineError::ReferenceNotFound { kind, id }
    }
}
