//! Error types for the incidents service.
//!
//! Uses `thiserror` for structured error variants covering storage,
//! request validation, and configuration. Validation errors never leave
//! the HTTP layer, so they are not part of `IncidentsError`.

/// Top-level error type for the incidents core library.
#[derive(Debug, thiserror::Error)]
pub enum IncidentsError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the SQLite incident store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Incident not found: {id}")]
    NotFound { id: i64 },

    #[error("Database directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors raised while checking a request payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{field}' must be at most {max} characters (got {len})")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: std::path::PathBuf },

    #[error("Configuration parse error: {0}")]
    Extract(#[from] Box<figment::Error>),
}

/// A type alias for results using the top-level `IncidentsError`.
pub type Result<T> = std::result::Result<T, IncidentsError>;
