//! Error types for template rendering.

use thiserror::Error;

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors that can occur while rendering a page or fragment.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Template rendering error.
    #[error("template error: {0}")]
    TemplateError(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Missing required data.
    #[error("missing required data: {0}")]
    MissingData(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<askama::Error> for RenderError {
    fn from(err: askama::Error) -> Self {
        RenderError::TemplateError(err.to_string())
    }
}

impl From<RenderError> for dv_common::Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::InvalidConfig(msg) => dv_common::Error::Config(msg),
            RenderError::JsonError(e) => dv_common::Error::Json(e),
            other => dv_common::Error::Template(other.to_string()),
        }
    }
}
