//! Autolink policy.
//!
//! A resolved value becomes a link to another detail page when either the
//! column is one of the configured "always link" columns (the subject itself
//! is the target), or the value is an object whose type has a detail route.

use std::collections::BTreeSet;

use dv_common::{ColumnDescriptor, Object, SafeHtml, Value};
use tracing::trace;

use crate::config::DEFAULT_AUTOLINK_COLUMNS;
use crate::routes::Routes;

/// Link text for an empty value in an always-link column.
const EMPTY_LINK_TEXT: &str = "-";

#[derive(Debug, Clone)]
pub struct AutolinkPolicy {
    columns: BTreeSet<String>,
}

impl AutolinkPolicy {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AutolinkPolicy {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Policy that never links a column to its own subject.
    pub fn objects_only() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn is_autolink_column(&self, field_path: &str) -> bool {
        self.columns.contains(field_path)
    }

    /// Link markup for `raw`, or `None` when the value stays as is.
    pub fn maybe_link(
        &self,
        descriptor: &ColumnDescriptor,
        subject: &dyn Object,
        raw: &Value,
        routes: &Routes,
    ) -> Option<SafeHtml> {
        let target: &dyn Object = if self.is_autolink_column(descriptor.field_path()) {
            subject
        } else {
            raw.as_object()?.as_ref()
        };
        let text = if raw.is_none() {
            EMPTY_LINK_TEXT.to_string()
        } else {
            raw.text_form()
        };

        match routes.detail_route(target) {
            Ok(url) => Some(SafeHtml::link(&url, &text)),
            Err(err) => {
                trace!(
                    field_path = descriptor.field_path(),
                    target = %target.type_key(),
                    error = %err,
                    "value not linkable"
                );
                None
            }
        }
    }
}

impl Default for AutolinkPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOLINK_COLUMNS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_common::{detail, ObjectId, ObjectRef, TypeKey};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Org {
        id: u64,
        name: &'static str,
        app: &'static str,
    }

    impl Object for Org {
        fn type_key(&self) -> TypeKey {
            TypeKey::new(self.app, "org")
        }
        fn object_id(&self) -> ObjectId {
            ObjectId::from(self.id)
        }
        fn label(&self) -> String {
            self.name.to_string()
        }
        fn attr(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(Value::Int(self.id as i64)),
                "name" => Some(Value::from(self.name)),
                _ => None,
            }
        }
    }

    fn routes() -> Routes {
        let mut routes = Routes::new("admin");
        routes.register(TypeKey::new("crm", "org"));
        routes
    }

    fn org(id: u64, app: &'static str) -> ObjectRef {
        Arc::new(Org {
            id,
            name: "Acme & Sons",
            app,
        })
    }

    #[test]
    fn test_id_column_links_to_subject() {
        let subject = org(3, "crm");
        let link = AutolinkPolicy::default()
            .maybe_link(&detail("id"), subject.as_ref(), &Value::Int(3), &routes())
            .unwrap();
        assert_eq!(link.as_str(), r#"<a href="/admin/crm/org/3/">3</a>"#);
    }

    #[test]
    fn test_object_value_links_to_itself() {
        let subject = org(1, "crm");
        let parent = Value::Object(org(9, "crm"));
        let link = AutolinkPolicy::default()
            .maybe_link(&detail("parent"), subject.as_ref(), &parent, &routes())
            .unwrap();
        assert_eq!(
            link.as_str(),
            r#"<a href="/admin/crm/org/9/">Acme &amp; Sons</a>"#
        );
    }

    #[test]
    fn test_plain_values_are_not_linked() {
        let subject = org(1, "crm");
        let policy = AutolinkPolicy::default();
        assert!(policy
            .maybe_link(&detail("name"), subject.as_ref(), &Value::from("x"), &routes())
            .is_none());
        assert!(policy
            .maybe_link(&detail("name"), subject.as_ref(), &Value::None, &routes())
            .is_none());
    }

    #[test]
    fn test_empty_id_column_still_links_to_subject() {
        let subject = org(4, "crm");
        let link = AutolinkPolicy::default()
            .maybe_link(&detail("id"), subject.as_ref(), &Value::None, &routes())
            .unwrap();
        assert_eq!(link.as_str(), r#"<a href="/admin/crm/org/4/">-</a>"#);
    }

    #[test]
    fn test_unroutable_targets_are_not_linked() {
        let subject = org(1, "billing");
        let policy = AutolinkPolicy::default();
        assert!(policy
            .maybe_link(&detail("id"), subject.as_ref(), &Value::Int(1), &routes())
            .is_none());
        let foreign = Value::Object(org(2, "billing"));
        assert!(policy
            .maybe_link(&detail("parent"), org(1, "crm").as_ref(), &foreign, &routes())
            .is_none());
    }

    #[test]
    fn test_custom_columns() {
        let policy = AutolinkPolicy::new(["name"]);
        assert!(policy.is_autolink_column("name"));
        assert!(!policy.is_autolink_column("id"));
        assert!(!AutolinkPolicy::objects_only().is_autolink_column("id"));
    }
}
