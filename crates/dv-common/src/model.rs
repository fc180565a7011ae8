//! Resolved records, tables, lazy fragments and the page layout tree.

use serde::{Serialize, Serializer};

use crate::descriptor::ColumnDescriptor;
use crate::html::DisplayValue;
use crate::value::{ObjectRef, Value};

/// Placeholder shown while a lazy fragment loads.
pub const DEFAULT_PLACEHOLDER: &str = "Loading...";

/// One descriptor resolved against one object.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCell {
    pub descriptor: ColumnDescriptor,
    pub raw_value: Value,
    pub display_value: DisplayValue,
}

/// One object's attribute view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Record {
    pub panel_name: Option<String>,
    /// Absent for placeholder shells.
    #[serde(serialize_with = "serialize_subject")]
    pub subject: Option<ObjectRef>,
    pub cells: Vec<ResolvedCell>,
    /// Per-row action results, in action order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<DisplayValue>,
}

impl Record {
    /// Find the cell for a field path.
    pub fn cell(&self, field_path: &str) -> Option<&ResolvedCell> {
        self.cells
            .iter()
            .find(|c| c.descriptor.field_path() == field_path)
    }

    /// Display values in descriptor order, as plain strings.
    pub fn display_values(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|c| c.display_value.to_string())
            .collect()
    }
}

fn serialize_subject<S: Serializer>(
    subject: &Option<ObjectRef>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match subject {
        Some(obj) => Value::Object(obj.clone()).serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// A bounded collection view under shared columns.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub panel_name: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Record>,
    /// Size of the whole collection.
    pub total_count: usize,
    /// Rows actually built; never more than `total_count`.
    pub displayed_count: usize,
    /// Row limit the table was built with; `None` means unbounded.
    pub limit: Option<usize>,
    pub view_all_url: Option<String>,
    pub allow_edit: bool,
}

impl Table {
    pub fn is_truncated(&self) -> bool {
        self.displayed_count < self.total_count
    }

    /// `"(10 of 15)"` when truncated, empty otherwise.
    pub fn count_label(&self) -> String {
        if self.is_truncated() {
            format!("({} of {})", self.displayed_count, self.total_count)
        } else {
            String::new()
        }
    }

    pub fn has_actions(&self) -> bool {
        self.rows.iter().any(|r| !r.actions.is_empty())
    }
}

/// Which builder a lazy fragment stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentType {
    #[default]
    Table,
    Details,
}

impl std::fmt::Display for FragmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentType::Table => write!(f, "table"),
            FragmentType::Details => write!(f, "details"),
        }
    }
}

/// Stand-in for a table or record whose data has not been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LazyFragment {
    pub lazy_key: String,
    pub panel_name: String,
    pub placeholder: String,
    pub fragment_type: FragmentType,
}

impl LazyFragment {
    pub fn new(lazy_key: impl Into<String>) -> Self {
        LazyFragment {
            lazy_key: lazy_key.into(),
            panel_name: String::new(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            fragment_type: FragmentType::Table,
        }
    }

    pub fn with_panel_name(mut self, panel_name: impl Into<String>) -> Self {
        self.panel_name = panel_name.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_fragment_type(mut self, fragment_type: FragmentType) -> Self {
        self.fragment_type = fragment_type;
        self
    }

    pub fn is_lazy(&self) -> bool {
        true
    }
}

/// Output of one builder call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "panel", rename_all = "lowercase")]
pub enum Panel {
    Table(Table),
    Record(Record),
    Lazy(LazyFragment),
}

impl Panel {
    pub fn panel_name(&self) -> Option<&str> {
        match self {
            Panel::Table(t) => t.panel_name.as_deref(),
            Panel::Record(r) => r.panel_name.as_deref(),
            Panel::Lazy(l) => Some(l.panel_name.as_str()),
        }
    }

    /// A value carrying rows is a table fragment.
    pub fn has_rows(&self) -> bool {
        matches!(self, Panel::Table(_))
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Panel::Lazy(_))
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Panel::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Panel::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_lazy(&self) -> Option<&LazyFragment> {
        match self {
            Panel::Lazy(l) => Some(l),
            _ => None,
        }
    }
}

/// One entry of a page layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutItem {
    /// Side-by-side columns; `None` is an empty slot.
    Row(Vec<Option<Panel>>),
    Header(String),
}

/// Ordered layout tree of a detail page.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Layout {
    pub items: Vec<LayoutItem>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, columns: Vec<Option<Panel>>) -> Self {
        self.items.push(LayoutItem::Row(columns));
        self
    }

    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.items.push(LayoutItem::Header(text.into()));
        self
    }

    /// All panels, in layout order.
    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.items.iter().flat_map(|item| match item {
            LayoutItem::Row(cols) => cols.iter().flatten().collect::<Vec<_>>(),
            LayoutItem::Header(_) => Vec::new(),
        })
    }

    pub fn lazy_fragments(&self) -> impl Iterator<Item = &LazyFragment> {
        self.panels().filter_map(Panel::as_lazy)
    }
}

/// Entry of a page's dropdown menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Confirmation prompt shown before following the link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<String>,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        MenuItem {
            label: label.into(),
            url: url.into(),
            target: None,
            confirm: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_confirm(mut self, confirm: impl Into<String>) -> Self {
        self.confirm = Some(confirm.into());
        self
    }
}

/// Everything a detail view definition produces for one object.
#[derive(Debug, Clone, Serialize)]
pub struct DetailPage {
    pub title: String,
    pub layout: Layout,
    pub menu: Vec<MenuItem>,
}
