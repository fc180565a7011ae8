//! Lazy fragments and the per-request render pass.
//!
//! A panel asked for with a lazy key is not built. The pass hands back a
//! [`LazyFragment`] shell instead, and the page later fetches the real panel
//! from the fragment route. Keys must be unique within one pass because they
//! become element ids and URL segments.

use std::collections::BTreeSet;

use dv_common::{
    ColumnDescriptor, Error, FragmentType, LazyFragment, ObjectRef, ObjectSet, Panel, Result,
    DEFAULT_PLACEHOLDER,
};
use tracing::debug;

use crate::builder::{
    build_record, build_table, validate_all, DetailsOptions, LazyLoad, TableOptions,
};
use crate::resolve::ValueResolver;
use crate::routes::{validate_lazy_key, Routes};

/// Lazy keys issued during one render pass.
#[derive(Debug, Clone, Default)]
pub struct LazyKeyRegistry {
    issued: BTreeSet<String>,
    order: Vec<String>,
}

impl LazyKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a lazy shell for `lazy_key`.
    ///
    /// Fails on a malformed key or on a key already issued in this pass.
    pub fn make_lazy(
        &mut self,
        panel_name: &str,
        fragment_type: FragmentType,
        lazy_key: &str,
        placeholder: &str,
    ) -> Result<LazyFragment> {
        validate_lazy_key(lazy_key)?;
        if !self.issued.insert(lazy_key.to_string()) {
            return Err(Error::DuplicateLazyKey {
                key: lazy_key.to_string(),
            });
        }
        self.order.push(lazy_key.to_string());
        debug!(lazy_key, %fragment_type, "lazy fragment issued");

        Ok(LazyFragment::new(lazy_key)
            .with_panel_name(panel_name)
            .with_placeholder(placeholder)
            .with_fragment_type(fragment_type))
    }

    pub fn contains(&self, lazy_key: &str) -> bool {
        self.issued.contains(lazy_key)
    }

    /// Keys in issue order.
    pub fn issued(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Start a new pass.
    pub fn reset(&mut self) {
        self.issued.clear();
        self.order.clear();
    }
}

/// State of one page or fragment render.
///
/// Owns the lazy key registry, so two concurrent requests never share keys.
pub struct RenderPass<'a> {
    resolver: ValueResolver<'a>,
    keys: LazyKeyRegistry,
    default_limit: Option<usize>,
    default_placeholder: String,
}

impl<'a> RenderPass<'a> {
    pub fn new(resolver: ValueResolver<'a>) -> Self {
        RenderPass {
            resolver,
            keys: LazyKeyRegistry::new(),
            default_limit: TableOptions::default().limit,
            default_placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Site-wide table limit and placeholder.
    pub fn with_defaults(mut self, limit: Option<usize>, placeholder: impl Into<String>) -> Self {
        self.default_limit = limit;
        self.default_placeholder = placeholder.into();
        self
    }

    pub fn resolver(&self) -> &ValueResolver<'a> {
        &self.resolver
    }

    pub fn routes(&self) -> &'a Routes {
        self.resolver.routes()
    }

    pub fn keys(&self) -> &LazyKeyRegistry {
        &self.keys
    }

    /// Table options seeded with the site defaults.
    pub fn table_options(&self) -> TableOptions {
        TableOptions::new().limit(self.default_limit)
    }

    fn placeholder_for(&self, lazy: &LazyLoad) -> String {
        lazy.placeholder
            .clone()
            .unwrap_or_else(|| self.default_placeholder.clone())
    }

    /// Record panel for `subject`, or a lazy shell.
    ///
    /// Descriptors are validated either way, so a bad field path fails the
    /// page render rather than the later fragment request.
    pub fn details_for(
        &mut self,
        subject: &ObjectRef,
        details: &[ColumnDescriptor],
        options: DetailsOptions,
    ) -> Result<Panel> {
        validate_all(details)?;
        let panel_name = options.panel_name.unwrap_or_default();
        if let Some(lazy) = &options.lazy {
            let placeholder = self.placeholder_for(lazy);
            return self
                .keys
                .make_lazy(&panel_name, FragmentType::Details, &lazy.key, &placeholder)
                .map(Panel::Lazy);
        }
        let name = (!panel_name.is_empty()).then_some(panel_name.as_str());
        build_record(&self.resolver, subject, details, name).map(Panel::Record)
    }

    /// Table panel over `collection`, or a lazy shell.
    ///
    /// A lazy table never calls `count` or `head` on the collection, but
    /// its columns are still validated.
    pub fn table_for<S: ObjectSet + ?Sized>(
        &mut self,
        collection: &S,
        columns: &[ColumnDescriptor],
        options: TableOptions,
    ) -> Result<Panel> {
        validate_all(columns)?;
        if let Some(lazy) = &options.lazy {
            let placeholder = self.placeholder_for(lazy);
            let panel_name = options.panel_name.clone().unwrap_or_default();
            return self
                .keys
                .make_lazy(&panel_name, FragmentType::Table, &lazy.key, &placeholder)
                .map(Panel::Lazy);
        }
        build_table(&self.resolver, collection, columns, &options).map(Panel::Table)
    }
}
