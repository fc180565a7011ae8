//! Column and field descriptors.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{Object, Value};

/// Explicit computation that bypasses attribute lookup.
pub type ValueFn = Arc<dyn Fn(&dyn Object) -> Value + Send + Sync>;

/// Declarative description of one field of a record or one column of a table.
///
/// Immutable once built: the builder methods consume and return `self`.
#[derive(Clone)]
pub struct ColumnDescriptor {
    field_path: String,
    display_name: String,
    value_fn: Option<ValueFn>,
}

impl ColumnDescriptor {
    /// Descriptor for a dotted attribute path, titled from the path.
    pub fn new(field_path: impl Into<String>) -> Self {
        let field_path = field_path.into();
        let display_name = humanize(&field_path);
        ColumnDescriptor {
            field_path,
            display_name,
            value_fn: None,
        }
    }

    /// Like [`ColumnDescriptor::new`], but rejects malformed paths.
    pub fn try_new(field_path: impl Into<String>) -> Result<Self> {
        let descriptor = Self::new(field_path);
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_value_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Object) -> Value + Send + Sync + 'static,
    {
        self.value_fn = Some(Arc::new(f));
        self
    }

    /// Check the path shape. A computed column only needs a non-empty
    /// identifier; an attribute column needs non-empty dotted segments.
    pub fn validate(&self) -> Result<()> {
        if self.field_path.trim().is_empty() {
            return Err(Error::InvalidDescriptor(
                "field_path must not be empty".to_string(),
            ));
        }
        if self.value_fn.is_none() && self.field_path.split('.').any(|s| s.trim().is_empty()) {
            return Err(Error::InvalidDescriptor(format!(
                "field_path '{}' has an empty segment",
                self.field_path
            )));
        }
        Ok(())
    }

    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn value_fn(&self) -> Option<&ValueFn> {
        self.value_fn.as_ref()
    }

    pub fn is_computed(&self) -> bool {
        self.value_fn.is_some()
    }

    /// Dotted path segments, in lookup order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.field_path.split('.')
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("field_path", &self.field_path)
            .field("display_name", &self.display_name)
            .field("computed", &self.is_computed())
            .finish()
    }
}

impl Serialize for ColumnDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ColumnDescriptor", 3)?;
        s.serialize_field("field_path", &self.field_path)?;
        s.serialize_field("display_name", &self.display_name)?;
        s.serialize_field("computed", &self.is_computed())?;
        s.end()
    }
}

/// Shorthand for a record field descriptor.
pub fn detail(field_path: impl Into<String>) -> ColumnDescriptor {
    ColumnDescriptor::new(field_path)
}

/// Shorthand for a table column descriptor.
pub fn col(field_path: impl Into<String>) -> ColumnDescriptor {
    ColumnDescriptor::new(field_path)
}

/// `created_at` -> `Created At`.
///
/// Underscores become spaces; a letter is uppercased when it follows a
/// non-letter and lowercased otherwise.
pub fn humanize(field_path: &str) -> String {
    let mut out = String::with_capacity(field_path.len());
    let mut prev_is_letter = false;
    for c in field_path.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
