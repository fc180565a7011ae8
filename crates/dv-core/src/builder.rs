//! Record and table builders.

use std::fmt;
use std::sync::Arc;

use dv_common::{
    ColumnDescriptor, DisplayValue, Object, ObjectRef, ObjectSet, Record, Result, Table,
};
use tracing::debug;

use crate::config::DEFAULT_TABLE_LIMIT;
use crate::resolve::ValueResolver;

/// Per-row computation whose result is attached to the row.
pub type RowAction = Arc<dyn Fn(&dyn Object) -> DisplayValue + Send + Sync>;

/// Request to defer a panel: the key names the producer that builds it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyLoad {
    pub key: String,
    /// Falls back to the site's default placeholder.
    pub placeholder: Option<String>,
}

impl LazyLoad {
    pub fn new(key: impl Into<String>) -> Self {
        LazyLoad {
            key: key.into(),
            placeholder: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// Options for a single-record panel.
#[derive(Debug, Clone, Default)]
pub struct DetailsOptions {
    pub panel_name: Option<String>,
    pub lazy: Option<LazyLoad>,
}

impl DetailsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel_name(mut self, panel_name: impl Into<String>) -> Self {
        self.panel_name = Some(panel_name.into());
        self
    }

    pub fn lazy(mut self, lazy: LazyLoad) -> Self {
        self.lazy = Some(lazy);
        self
    }
}

/// Options for a table panel.
#[derive(Clone)]
pub struct TableOptions {
    pub panel_name: Option<String>,
    /// Maximum rows; `None` or `Some(0)` shows the whole collection.
    pub limit: Option<usize>,
    pub row_actions: Vec<RowAction>,
    pub view_all_url: Option<String>,
    pub allow_edit: bool,
    pub lazy: Option<LazyLoad>,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            panel_name: None,
            limit: Some(DEFAULT_TABLE_LIMIT),
            row_actions: Vec::new(),
            view_all_url: None,
            allow_edit: false,
            lazy: None,
        }
    }
}

impl fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOptions")
            .field("panel_name", &self.panel_name)
            .field("limit", &self.limit)
            .field("row_actions", &self.row_actions.len())
            .field("view_all_url", &self.view_all_url)
            .field("allow_edit", &self.allow_edit)
            .field("lazy", &self.lazy)
            .finish()
    }
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel_name(mut self, panel_name: impl Into<String>) -> Self {
        self.panel_name = Some(panel_name.into());
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn row_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&dyn Object) -> DisplayValue + Send + Sync + 'static,
    {
        self.row_actions.push(Arc::new(action));
        self
    }

    pub fn view_all_url(mut self, url: impl Into<String>) -> Self {
        self.view_all_url = Some(url.into());
        self
    }

    pub fn allow_edit(mut self, allow_edit: bool) -> Self {
        self.allow_edit = allow_edit;
        self
    }

    pub fn lazy(mut self, lazy: LazyLoad) -> Self {
        self.lazy = Some(lazy);
        self
    }

    /// Limit as passed to [`ObjectSet::head`].
    fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|&n| n > 0)
    }
}

/// Check every descriptor's path shape.
pub(crate) fn validate_all(descriptors: &[ColumnDescriptor]) -> Result<()> {
    descriptors.iter().try_for_each(ColumnDescriptor::validate)
}

/// Resolve `descriptors` against one object, in descriptor order.
pub fn build_record(
    resolver: &ValueResolver<'_>,
    subject: &ObjectRef,
    descriptors: &[ColumnDescriptor],
    panel_name: Option<&str>,
) -> Result<Record> {
    validate_all(descriptors)?;
    record_for(resolver, subject, descriptors, panel_name)
}

fn record_for(
    resolver: &ValueResolver<'_>,
    subject: &ObjectRef,
    descriptors: &[ColumnDescriptor],
    panel_name: Option<&str>,
) -> Result<Record> {
    let cells = descriptors
        .iter()
        .map(|d| resolver.resolve(d, subject.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(Record {
        panel_name: panel_name.map(str::to_string),
        subject: Some(subject.clone()),
        cells,
        actions: Vec::new(),
    })
}

/// Build a bounded table over `collection`.
///
/// Rows keep collection order and each row is an independent copy; the
/// collection is only read through `count` and `head`.
pub fn build_table<S: ObjectSet + ?Sized>(
    resolver: &ValueResolver<'_>,
    collection: &S,
    descriptors: &[ColumnDescriptor],
    options: &TableOptions,
) -> Result<Table> {
    validate_all(descriptors)?;

    let total_count = collection.count();
    let objects = collection.head(options.effective_limit());
    let mut rows = Vec::with_capacity(objects.len());
    for object in &objects {
        let mut record = record_for(resolver, object, descriptors, None)?;
        record.actions = options
            .row_actions
            .iter()
            .map(|action| action(object.as_ref()))
            .collect();
        rows.push(record);
    }

    let displayed_count = rows.len().min(total_count);
    debug!(
        panel = options.panel_name.as_deref().unwrap_or(""),
        total_count,
        displayed_count,
        "table built"
    );

    Ok(Table {
        panel_name: options.panel_name.clone(),
        columns: descriptors.to_vec(),
        rows,
        total_count,
        displayed_count,
        limit: options.effective_limit(),
        view_all_url: options.view_all_url.clone(),
        allow_edit: options.allow_edit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autolink::AutolinkPolicy;
    use crate::format::FormatterRegistry;
    use crate::routes::Routes;
    use dv_common::{col, detail, Error, ObjectId, ObjectRef, SafeHtml, TypeKey, Value};

    #[derive(Debug)]
    struct Contact {
        id: u64,
        name: String,
        email: Option<String>,
    }

    impl Object for Contact {
        fn type_key(&self) -> TypeKey {
            TypeKey::new("crm", "contact")
        }
        fn object_id(&self) -> ObjectId {
            ObjectId::from(self.id)
        }
        fn label(&self) -> String {
            self.name.clone()
        }
        fn attr(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(Value::Int(self.id as i64)),
                "name" => Some(Value::from(self.name.clone())),
                "email" => Some(Value::from(self.email.clone())),
                _ => None,
            }
        }
    }

    fn contacts(n: u64) -> Vec<ObjectRef> {
        (1..=n)
            .map(|id| {
                Arc::new(Contact {
                    id,
                    name: format!("Contact {id}"),
                    email: (id % 2 == 0).then(|| format!("c{id}@example.com")),
                }) as ObjectRef
            })
            .collect()
    }

    struct Fixture {
        formatters: FormatterRegistry,
        autolink: AutolinkPolicy,
        routes: Routes,
    }

    fn fixture() -> Fixture {
        let mut routes = Routes::new("admin");
        routes.register(TypeKey::new("crm", "contact"));
        Fixture {
            formatters: FormatterRegistry::default(),
            autolink: AutolinkPolicy::default(),
            routes,
        }
    }

    impl Fixture {
        fn resolver(&self) -> ValueResolver<'_> {
            ValueResolver::new(&self.formatters, &self.autolink, &self.routes)
        }
    }

    #[test]
    fn test_build_record_in_descriptor_order() {
        let f = fixture();
        let subject = &contacts(1)[0];
        let record = build_record(
            &f.resolver(),
            subject,
            &[detail("name"), detail("id")],
            Some("Contact Details"),
        )
        .unwrap();
        assert_eq!(record.panel_name.as_deref(), Some("Contact Details"));
        assert_eq!(record.subject.as_ref().unwrap().label(), "Contact 1");
        assert_eq!(record.cells.len(), 2);
        assert_eq!(record.cells[0].display_value.to_string(), "Contact 1");
        assert_eq!(
            record.cells[1].display_value.to_html(),
            r#"<a href="/admin/crm/contact/1/">1</a>"#
        );
    }

    #[test]
    fn test_invalid_descriptor_rejected_before_resolution() {
        let f = fixture();
        let subject = &contacts(1)[0];
        let err = build_record(&f.resolver(), subject, &[detail("a..b")], None).unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor(_)));
    }

    #[test]
    fn test_table_limit_and_counts() {
        let f = fixture();
        let source = contacts(15);
        let table = build_table(
            &f.resolver(),
            &source,
            &[col("id"), col("name")],
            &TableOptions::default(),
        )
        .unwrap();
        assert_eq!(table.displayed_count, 10);
        assert_eq!(table.total_count, 15);
        assert_eq!(table.rows.len(), 10);
        assert!(table.is_truncated());
        assert_eq!(table.limit, Some(10));
    }

    #[test]
    fn test_table_unbounded_limits() {
        let f = fixture();
        let source = contacts(15);
        for limit in [None, Some(0)] {
            let table = build_table(
                &f.resolver(),
                &source,
                &[col("name")],
                &TableOptions::new().limit(limit),
            )
            .unwrap();
            assert_eq!(table.displayed_count, 15);
            assert!(!table.is_truncated());
        }
    }

    #[test]
    fn test_small_collection_keeps_order() {
        let f = fixture();
        let source = contacts(5);
        let table = build_table(
            &f.resolver(),
            &source,
            &[col("id"), col("name"), col("email")],
            &TableOptions::new().limit(Some(10)),
        )
        .unwrap();
        assert_eq!(table.displayed_count, 5);
        assert_eq!(table.total_count, 5);
        let names: Vec<String> = table
            .rows
            .iter()
            .map(|r| r.cells[1].display_value.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["Contact 1", "Contact 2", "Contact 3", "Contact 4", "Contact 5"]
        );
        assert_eq!(table.rows[0].cells[2].display_value.to_string(), "-");
    }

    #[test]
    fn test_rows_are_independent() {
        let f = fixture();
        let source = contacts(3);
        let mut table = build_table(
            &f.resolver(),
            &source,
            &[col("name")],
            &TableOptions::default(),
        )
        .unwrap();
        table.rows[0].cells[0].display_value = DisplayValue::text("changed");
        table.rows[0].actions.push(DisplayValue::text("extra"));
        assert_eq!(table.rows[1].cells[0].display_value.to_string(), "Contact 2");
        assert!(table.rows[1].actions.is_empty());
        assert_eq!(source.len(), 3);
        assert_eq!(source[0].label(), "Contact 1");
    }

    #[test]
    fn test_row_actions_in_order() {
        let f = fixture();
        let source = contacts(2);
        let options = TableOptions::new()
            .row_action(|obj| {
                DisplayValue::Html(SafeHtml::link(
                    &format!("/mail/{}/", obj.object_id()),
                    "Email",
                ))
            })
            .row_action(|obj| DisplayValue::text(format!("#{}", obj.object_id())));
        let table = build_table(&f.resolver(), &source, &[col("name")], &options).unwrap();
        assert!(table.has_actions());
        let second = &table.rows[1];
        assert_eq!(second.actions.len(), 2);
        assert_eq!(
            second.actions[0].to_html(),
            r#"<a href="/mail/2/">Email</a>"#
        );
        assert_eq!(second.actions[1].to_string(), "#2");
        assert_eq!(second.subject.as_ref().unwrap().label(), "Contact 2");
    }

    #[test]
    fn test_missing_column_fails_table() {
        let f = fixture();
        let source = contacts(2);
        let err = build_table(
            &f.resolver(),
            &source,
            &[col("phone")],
            &TableOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AttributeResolution { .. }));
    }
}
