//! Error types for the detail view engine.
//!
//! Every error carries:
//! - a stable numeric code for machine parsing
//! - a category used to decide how the failure surfaces
//! - an HTTP-class status for the fragment/page surface
//!
//! # Failure classes
//!
//! ```text
//! config      (10-19)  fail fast at construction (duplicate lazy key, bad descriptor)
//! resolution  (20-29)  propagate to the caller (missing attribute on a subject)
//! format      (30-39)  recovered inside the resolver, never escapes a cell
//! route       (40-49)  recovered by the autolink policy as "no link"
//! not_found   (50-59)  404-class outcome (unknown object or fragment key)
//! producer    (60-69)  500-class outcome (broken producer, template failure)
//! io          (70-79)  configuration files and serialization
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{ObjectId, TypeKey};

/// Result type alias for detail view operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Development-time mistakes in a view definition or configuration.
    Config,
    /// Attribute lookup failed on a concrete subject.
    Resolution,
    /// A value formatter rejected its input.
    Format,
    /// No route could be derived for an object.
    Route,
    /// Unknown object or fragment key at request time.
    NotFound,
    /// Fragment producer or template failure.
    Producer,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Resolution => write!(f, "resolution"),
            ErrorCategory::Format => write!(f, "format"),
            ErrorCategory::Route => write!(f, "route"),
            ErrorCategory::NotFound => write!(f, "not_found"),
            ErrorCategory::Producer => write!(f, "producer"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the detail view engine.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid column descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Duplicate lazy_key '{key}' detected. Each lazy fragment in a render pass needs a unique key.")]
    DuplicateLazyKey { key: String },

    #[error("invalid lazy key '{key}': only ASCII letters, digits, '_' and '-' are allowed")]
    InvalidLazyKey { key: String },

    #[error("invalid object id '{0}'")]
    InvalidObjectId(String),

    // Resolution errors (20-29)
    #[error("cannot resolve '{path}': {type_name} has no attribute '{segment}'")]
    AttributeResolution {
        path: String,
        segment: String,
        type_name: String,
    },

    // Format errors (30-39)
    #[error("formatter '{formatter}' failed: {reason}")]
    Format { formatter: String, reason: String },

    // Route errors (40-49)
    #[error("no route registered for {type_key}")]
    RouteNotFound { type_key: TypeKey },

    // Not found (50-59)
    #[error("{type_key} with id={id} not found")]
    ObjectNotFound { type_key: TypeKey, id: ObjectId },

    #[error("lazy fragment '{producer}' not found on {type_key} detail view")]
    FragmentNotFound { type_key: TypeKey, producer: String },

    // Producer errors (60-69)
    #[error("lazy producer '{key}' failed: {source}")]
    ProducerFailed {
        key: String,
        #[source]
        source: Box<Error>,
    },

    #[error("template error: {0}")]
    Template(String),

    // I/O errors (70-79)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidDescriptor(_) => 11,
            Error::DuplicateLazyKey { .. } => 12,
            Error::InvalidLazyKey { .. } => 13,
            Error::InvalidObjectId(_) => 14,
            Error::AttributeResolution { .. } => 20,
            Error::Format { .. } => 30,
            Error::RouteNotFound { .. } => 40,
            Error::ObjectNotFound { .. } => 50,
            Error::FragmentNotFound { .. } => 51,
            Error::ProducerFailed { .. } => 60,
            Error::Template(_) => 61,
            Error::Io(_) => 70,
            Error::Json(_) => 71,
            Error::Toml(_) => 72,
            Error::TomlSerialize(_) => 73,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidDescriptor(_)
            | Error::DuplicateLazyKey { .. }
            | Error::InvalidLazyKey { .. }
            | Error::InvalidObjectId(_) => ErrorCategory::Config,

            Error::AttributeResolution { .. } => ErrorCategory::Resolution,

            Error::Format { .. } => ErrorCategory::Format,

            Error::RouteNotFound { .. } => ErrorCategory::Route,

            Error::ObjectNotFound { .. } | Error::FragmentNotFound { .. } => {
                ErrorCategory::NotFound
            }

            Error::ProducerFailed { .. } | Error::Template(_) => ErrorCategory::Producer,

            Error::Io(_) | Error::Json(_) | Error::Toml(_) | Error::TomlSerialize(_) => {
                ErrorCategory::Io
            }
        }
    }

    /// HTTP-class status for the page and fragment surface.
    ///
    /// Only not-found outcomes map to 404; everything else reaching the
    /// request boundary is a server fault.
    pub fn http_status(&self) -> u16 {
        match self.category() {
            ErrorCategory::NotFound => 404,
            _ => 500,
        }
    }

    /// Whether this error is a 404-class outcome.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company() -> TypeKey {
        TypeKey::new("companies", "company")
    }

    #[test]
    fn test_error_codes_by_category() {
        let dup = Error::DuplicateLazyKey {
            key: "contacts".to_string(),
        };
        assert_eq!(dup.code(), 12);
        assert_eq!(dup.category(), ErrorCategory::Config);

        let missing = Error::AttributeResolution {
            path: "company.nickname".to_string(),
            segment: "nickname".to_string(),
            type_name: "Company".to_string(),
        };
        assert_eq!(missing.code(), 20);
        assert_eq!(missing.category(), ErrorCategory::Resolution);
    }

    #[test]
    fn test_duplicate_key_message() {
        let err = Error::DuplicateLazyKey {
            key: "contacts".to_string(),
        };
        assert!(err
            .to_string()
            .starts_with("Duplicate lazy_key 'contacts' detected"));
    }

    #[test]
    fn test_http_status_mapping() {
        let not_found = Error::ObjectNotFound {
            type_key: company(),
            id: ObjectId::from(7u64),
        };
        assert_eq!(not_found.http_status(), 404);
        assert!(not_found.is_not_found());

        let no_fragment = Error::FragmentNotFound {
            type_key: company(),
            producer: "lazy_nope".to_string(),
        };
        assert_eq!(no_fragment.http_status(), 404);

        let broken = Error::ProducerFailed {
            key: "contacts".to_string(),
            source: Box::new(Error::Template("boom".to_string())),
        };
        assert_eq!(broken.http_status(), 500);
        assert!(!broken.is_not_found());
    }

    #[test]
    fn test_producer_failure_keeps_source() {
        use std::error::Error as _;

        let err = Error::ProducerFailed {
            key: "contacts".to_string(),
            source: Box::new(Error::Config("bad".to_string())),
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("configuration error: bad"));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Config.to_string(), "config");
    }
}
