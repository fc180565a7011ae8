//! Object identity types.
//!
//! A detail page is addressed by the pair (type key, object id). Both halves
//! end up as URL path segments, so both are validated to be path-safe.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Namespaced type identity: `<app_label>.<model_name>`.
///
/// Route names and URLs are derived from this pair, which keeps two types
/// with the same model name in different apps apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey {
    pub app_label: String,
    pub model_name: String,
}

impl TypeKey {
    /// Create a type key. Both parts are lowercased.
    pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
        TypeKey {
            app_label: app_label.into().to_lowercase(),
            model_name: model_name.into().to_lowercase(),
        }
    }

    /// Route name for an action on this type, e.g. `companies_company_detail`.
    pub fn route_name(&self, action: &str) -> String {
        format!("{}_{}_{}", self.app_label, self.model_name, action)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

impl FromStr for TypeKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (app, model) = s
            .split_once('.')
            .ok_or_else(|| Error::Config(format!("type key '{}' must be <app>.<model>", s)))?;
        if !is_path_segment(app) || !is_path_segment(model) || model.contains('.') {
            return Err(Error::Config(format!(
                "type key '{}' must be <app>.<model> with path-safe parts",
                s
            )));
        }
        Ok(TypeKey::new(app, model))
    }
}

/// Unique identifier of an object within its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an identifier taken from a URL or the CLI.
    pub fn parse(s: &str) -> Result<Self> {
        if is_path_segment(s) {
            Ok(ObjectId(s.to_string()))
        } else {
            Err(Error::InvalidObjectId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        ObjectId(id.to_string())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ObjectId::parse(s)
    }
}

/// A non-empty string that can sit between two `/` in a URL path.
fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}
