//! Detail view common types.
//!
//! This crate provides the data model shared by the resolver, the builders,
//! the fragment dispatcher and the renderer:
//! - Object identity (`TypeKey`, `ObjectId`) and the `Object` capability trait
//! - Runtime `Value`s and display-safe `DisplayValue`s
//! - Column descriptors
//! - Resolved records, tables, lazy fragments and the page layout tree
//! - The unified error type

pub mod descriptor;
pub mod error;
pub mod html;
pub mod id;
pub mod model;
pub mod value;

pub use descriptor::{col, detail, humanize, ColumnDescriptor, ValueFn};
pub use error::{Error, ErrorCategory, Result};
pub use html::{html_escape, DisplayValue, SafeHtml};
pub use id::{ObjectId, TypeKey};
pub use model::{
    DetailPage, FragmentType, Layout, LayoutItem, LazyFragment, MenuItem, Panel, Record,
    ResolvedCell, Table, DEFAULT_PLACEHOLDER,
};
pub use value::{Currency, FileRef, Money, Object, ObjectRef, ObjectSet, Value};
