use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the entire Tome workspace.
#[derive(Error, Debug)]
pub enum TomeError {
    // ── Request-time lookups ───────────────────────────────────
    #[error("skill bundle not found: {0}")]
    BundleNotFound(String),

    #[error("skill bundle not active in this session: {0}")]
    BundleNotActive(String),

    #[error("topic not found: {bundle}/{topic}")]
    TopicNotFound { bundle: String, topic: String },

    // ── Load-time (registry construction) ──────────────────────
    #[error("invalid skill definition {}: {reason}", path.display())]
    Definition { path: PathBuf, reason: String },

    #[error("duplicate skill bundle: {0}")]
    DuplicateBundle(String),

    #[error("orphan detail document {bundle}/{topic}: not referenced from the summary")]
    OrphanDetail { bundle: String, topic: String },

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl TomeError {
    /// True for the lookup failures a host treats as "no specialized
    /// guidance available": unknown bundle, inactive bundle, unknown topic.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TomeError::BundleNotFound(_)
                | TomeError::BundleNotActive(_)
                | TomeError::TopicNotFound { .. }
        )
    }

    /// Shorthand for a [`TomeError::Definition`] error.
    pub fn definition(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TomeError::Definition {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TomeError>;
