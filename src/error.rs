//! Error types for pagination

use thiserror::Error;

/// Errors raised by the pagination engine and its collaborators
#[derive(Debug, Error)]
pub enum PaginationError {
    /// Page geometry leaves no usable content area
    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// No layout engine is available to measure content
    #[error("no layout engine available for measurement")]
    LayoutUnavailable,

    /// The layout oracle failed or returned an unusable height
    #[error("measurement failed for fragment at {offset}: {reason}")]
    Measurement { offset: usize, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A newer invalidation replaced the run this result belongs to
    #[error("pagination result superseded by generation {latest}")]
    Superseded { latest: u64 },
}

impl PaginationError {
    pub(crate) fn measurement(offset: usize, reason: impl Into<String>) -> Self {
        PaginationError::Measurement {
            offset,
            reason: reason.into(),
        }
    }
}

/// Errors loading a pagination configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported value for `{field}`: {value}")]
    Unsupported { field: &'static str, value: String },
}

/// Errors parsing a footer template
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown footer token `{{{0}}}`")]
    UnknownToken(String),

    #[error("unterminated token starting at byte {0}")]
    Unterminated(usize),

    #[error("unmatched `}}` at byte {0}")]
    UnmatchedClose(usize),
}

pub type Result<T, E = PaginationError> = std::result::Result<T, E>;
