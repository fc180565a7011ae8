//! Value resolution: descriptor + object -> resolved cell.

use dv_common::{ColumnDescriptor, Error, Object, ResolvedCell, Result, Value};
use tracing::trace;

use crate::autolink::AutolinkPolicy;
use crate::format::FormatterRegistry;
use crate::routes::Routes;

/// Resolves descriptors against objects.
///
/// Borrows its collaborators, so a resolver is cheap to build per request.
#[derive(Clone, Copy)]
pub struct ValueResolver<'a> {
    formatters: &'a FormatterRegistry,
    autolink: &'a AutolinkPolicy,
    routes: &'a Routes,
}

impl<'a> ValueResolver<'a> {
    pub fn new(
        formatters: &'a FormatterRegistry,
        autolink: &'a AutolinkPolicy,
        routes: &'a Routes,
    ) -> Self {
        ValueResolver {
            formatters,
            autolink,
            routes,
        }
    }

    pub fn routes(&self) -> &'a Routes {
        self.routes
    }

    /// Resolve one descriptor against one object.
    ///
    /// A computed descriptor bypasses both attribute lookup and autolinking.
    /// Otherwise a missing attribute anywhere on the path is an error, never
    /// an empty value.
    pub fn resolve(&self, descriptor: &ColumnDescriptor, subject: &dyn Object) -> Result<ResolvedCell> {
        let (raw_value, link) = match descriptor.value_fn() {
            Some(value_fn) => (value_fn(subject), None),
            None => {
                let raw = lookup_path(subject, descriptor)?;
                let link = self
                    .autolink
                    .maybe_link(descriptor, subject, &raw, self.routes);
                (raw, link)
            }
        };

        let display_value = match link {
            Some(html) => html.into(),
            None => self.formatters.format(&raw_value),
        };

        trace!(
            field_path = descriptor.field_path(),
            kind = raw_value.kind(),
            "cell resolved"
        );

        Ok(ResolvedCell {
            descriptor: descriptor.clone(),
            raw_value,
            display_value,
        })
    }
}

/// Walk a dotted path one attribute at a time.
fn lookup_path(subject: &dyn Object, descriptor: &ColumnDescriptor) -> Result<Value> {
    let path = descriptor.field_path();
    let mut segments = descriptor.segments();
    let first = segments.next().unwrap_or_default();
    let mut current = subject
        .attr(first)
        .ok_or_else(|| missing(path, first, subject.type_name()))?;

    for segment in segments {
        let next = match &current {
            Value::Object(obj) => obj
                .attr(segment)
                .ok_or_else(|| missing(path, segment, obj.type_name()))?,
            other => return Err(missing(path, segment, other.kind().to_string())),
        };
        current = next;
    }
    Ok(current)
}

fn missing(path: &str, segment: &str, type_name: String) -> Error {
    Error::AttributeResolution {
        path: path.to_string(),
        segment: segment.to_string(),
        type_name,
    }
}
