//! Template renderer for detail pages and lazy fragments.

use std::collections::BTreeMap;

use askama::Template;
use dv_common::{
    html_escape, DetailPage, FragmentType, LayoutItem, LazyFragment, MenuItem, Panel, Record,
    Table,
};
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};

/// Client-side loader for lazy panels and menu confirmations.
const PAGE_SCRIPT: &str = include_str!("../templates/detail_page.js");

/// What to render, and the only data the template may see.
#[derive(Debug, Clone, Copy)]
pub enum TemplateContext<'a> {
    /// A full detail page. `lazy_urls` maps every lazy key on the page to its
    /// fragment URL.
    DetailPage {
        page: &'a DetailPage,
        lazy_urls: &'a BTreeMap<String, String>,
    },
    /// A table fragment.
    ObjectList { object_list: &'a Table },
    /// A single-record fragment.
    ObjectDetails { object_details: &'a Record },
}

impl TemplateContext<'_> {
    /// Template name for this context.
    pub fn name(&self) -> &'static str {
        match self {
            TemplateContext::DetailPage { .. } => "detail_page.html",
            TemplateContext::ObjectList { .. } => "object_list.html",
            TemplateContext::ObjectDetails { .. } => "object_details.html",
        }
    }
}

/// Renders a template context into markup.
pub trait TemplateRenderer: Send + Sync {
    fn render_template(&self, context: &TemplateContext<'_>) -> Result<String>;
}

#[derive(Template)]
#[template(path = "detail_page.html")]
struct DetailPageTemplate<'a> {
    title: &'a str,
    site_title: &'a str,
    theme: &'a str,
    stylesheet_href: String,
    menu: Vec<MenuView>,
    rows: Vec<PageRowView>,
    script: &'a str,
}

struct MenuView {
    label: String,
    href: String,
    /// Pre-escaped ` target=".."`/` data-confirm=".."` attributes.
    extra_attrs: String,
}

impl From<&MenuItem> for MenuView {
    fn from(item: &MenuItem) -> Self {
        let mut extra_attrs = String::new();
        if let Some(target) = &item.target {
            extra_attrs.push_str(&format!(r#" target="{}" rel="noopener""#, html_escape(target)));
        }
        if let Some(confirm) = &item.confirm {
            extra_attrs.push_str(&format!(r#" data-confirm="{}""#, html_escape(confirm)));
        }
        MenuView {
            label: item.label.clone(),
            href: html_escape(&item.url),
            extra_attrs,
        }
    }
}

struct PageRowView {
    is_header: bool,
    header: String,
    /// Rendered panel markup per column; empty for an empty slot.
    columns: Vec<String>,
}

#[derive(Template)]
#[template(path = "object_list.html")]
struct ObjectListTemplate<'a> {
    panel_name: &'a str,
    count_label: String,
    view_all_href: String,
    allow_edit: bool,
    headers: Vec<&'a str>,
    has_actions: bool,
    colspan: usize,
    rows: Vec<RowView>,
}

struct RowView {
    cells: Vec<String>,
    actions: Vec<String>,
}

#[derive(Template)]
#[template(path = "object_details.html")]
struct ObjectDetailsTemplate<'a> {
    panel_name: &'a str,
    fields: Vec<FieldView<'a>>,
    actions: Vec<String>,
}

struct FieldView<'a> {
    label: &'a str,
    value_html: String,
}

#[derive(Template)]
#[template(path = "lazy_panel.html")]
struct LazyPanelTemplate<'a> {
    lazy_key: &'a str,
    panel_name: &'a str,
    placeholder: &'a str,
    fragment_type: FragmentType,
    url_href: String,
}

/// Askama-backed HTML renderer.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    config: RenderConfig,
}

impl HtmlRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn render_page(
        &self,
        page: &DetailPage,
        lazy_urls: &BTreeMap<String, String>,
    ) -> Result<String> {
        let mut rows = Vec::with_capacity(page.layout.items.len());
        for item in &page.layout.items {
            match item {
                LayoutItem::Header(text) => rows.push(PageRowView {
                    is_header: true,
                    header: text.clone(),
                    columns: Vec::new(),
                }),
                LayoutItem::Row(slots) => {
                    let mut columns = Vec::with_capacity(slots.len());
                    for slot in slots {
                        columns.push(match slot {
                            Some(panel) => self.render_panel(panel, lazy_urls)?,
                            None => String::new(),
                        });
                    }
                    rows.push(PageRowView {
                        is_header: false,
                        header: String::new(),
                        columns,
                    });
                }
            }
        }

        let template = DetailPageTemplate {
            title: &page.title,
            site_title: &self.config.site_title,
            theme: self.config.theme.attr_value(),
            stylesheet_href: self
                .config
                .stylesheet_url
                .as_deref()
                .map(html_escape)
                .unwrap_or_default(),
            menu: page.menu.iter().map(MenuView::from).collect(),
            rows,
            script: PAGE_SCRIPT,
        };
        Ok(template.render()?)
    }

    fn render_panel(&self, panel: &Panel, lazy_urls: &BTreeMap<String, String>) -> Result<String> {
        match panel {
            Panel::Table(table) => render_table(table),
            Panel::Record(record) => render_record(record),
            Panel::Lazy(fragment) => {
                let url = lazy_urls.get(&fragment.lazy_key).ok_or_else(|| {
                    RenderError::MissingData(format!(
                        "no fragment URL for lazy key '{}'",
                        fragment.lazy_key
                    ))
                })?;
                render_lazy(fragment, url)
            }
        }
    }

    fn finish(&self, context: &TemplateContext<'_>, html: String) -> String {
        let output = if self.config.should_minify() {
            let cfg = minify_html::Cfg {
                minify_js: true,
                minify_css: true,
                keep_closing_tags: true,
                ..Default::default()
            };
            String::from_utf8(minify_html::minify(html.as_bytes(), &cfg)).unwrap_or(html)
        } else {
            html
        };

        info!(
            template = context.name(),
            bytes = output.len(),
            "Template rendered"
        );
        output
    }
}

impl TemplateRenderer for HtmlRenderer {
    fn render_template(&self, context: &TemplateContext<'_>) -> Result<String> {
        debug!(template = context.name(), "Rendering template");
        let html = match context {
            TemplateContext::DetailPage { page, lazy_urls } => self.render_page(page, lazy_urls)?,
            TemplateContext::ObjectList { object_list } => render_table(object_list)?,
            TemplateContext::ObjectDetails { object_details } => render_record(object_details)?,
        };
        Ok(self.finish(context, html))
    }
}

fn render_table(table: &Table) -> Result<String> {
    let has_actions = table.has_actions();
    let rows = table
        .rows
        .iter()
        .map(|record| RowView {
            cells: record
                .cells
                .iter()
                .map(|c| c.display_value.to_html())
                .collect(),
            actions: record.actions.iter().map(|a| a.to_html()).collect(),
        })
        .collect();

    let template = ObjectListTemplate {
        panel_name: table.panel_name.as_deref().unwrap_or(""),
        count_label: table.count_label(),
        view_all_href: table
            .view_all_url
            .as_deref()
            .map(html_escape)
            .unwrap_or_default(),
        allow_edit: table.allow_edit,
        headers: table.columns.iter().map(|c| c.display_name()).collect(),
        has_actions,
        colspan: table.columns.len() + usize::from(has_actions),
        rows,
    };
    Ok(template.render()?)
}

fn render_record(record: &Record) -> Result<String> {
    let template = ObjectDetailsTemplate {
        panel_name: record.panel_name.as_deref().unwrap_or(""),
        fields: record
            .cells
            .iter()
            .map(|c| FieldView {
                label: c.descriptor.display_name(),
                value_html: c.display_value.to_html(),
            })
            .collect(),
        actions: record.actions.iter().map(|a| a.to_html()).collect(),
    };
    Ok(template.render()?)
}

fn render_lazy(fragment: &LazyFragment, url: &str) -> Result<String> {
    let template = LazyPanelTemplate {
        lazy_key: &fragment.lazy_key,
        panel_name: &fragment.panel_name,
        placeholder: &fragment.placeholder,
        fragment_type: fragment.fragment_type,
        url_href: html_escape(url),
    };
    Ok(template.render()?)
}
