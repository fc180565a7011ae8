//! The detail site: routes, view definitions, object store and renderer.

use std::collections::BTreeMap;
use std::sync::Arc;

use dv_common::{DetailPage, Error, ObjectId, ObjectRef, Result, TypeKey};
use dv_render::{HtmlRenderer, TemplateContext, TemplateRenderer};
use tracing::{error, info, warn};

use crate::autolink::AutolinkPolicy;
use crate::config::SiteConfig;
use crate::dispatch::{DetailViewDef, FragmentDispatcher, ObjectStore};
use crate::format::FormatterRegistry;
use crate::lazy::RenderPass;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::resolve::ValueResolver;
use crate::routes::{RouteMatch, Routes};

/// Path answered with a plain `ok`.
pub const HEALTH_PATH: &str = "/healthz";

/// Transport-neutral response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl SiteResponse {
    pub fn html(body: String) -> Self {
        SiteResponse {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        SiteResponse {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(html) => SiteResponse::html(html),
            Err(err) if err.is_not_found() => {
                warn!(code = err.code(), error = %err, "not found");
                SiteResponse::text(404, err.to_string())
            }
            Err(err) => {
                error!(code = err.code(), category = %err.category(), error = %err, "request failed");
                SiteResponse::text(err.http_status(), "Internal Server Error")
            }
        }
    }
}

/// Everything needed to serve detail pages and their fragments.
pub struct DetailSite {
    config: SiteConfig,
    routes: Routes,
    formatters: FormatterRegistry,
    autolink: AutolinkPolicy,
    views: BTreeMap<TypeKey, DetailViewDef>,
    store: Arc<dyn ObjectStore>,
    renderer: Box<dyn TemplateRenderer>,
}

impl DetailSite {
    /// Build a site from validated configuration.
    pub fn new(config: SiteConfig, store: Arc<dyn ObjectStore>) -> Result<Self> {
        config.validate()?;
        Ok(DetailSite {
            routes: Routes::new(config.namespace.clone()),
            formatters: FormatterRegistry::with_defaults(&config.display),
            autolink: AutolinkPolicy::new(config.autolink_columns.iter().cloned()),
            views: BTreeMap::new(),
            store,
            renderer: Box::new(HtmlRenderer::new(config.render.clone())),
            config,
        })
    }

    pub fn with_renderer<R: TemplateRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Formatter registry, for adding plug-ins.
    pub fn formatters_mut(&mut self) -> &mut FormatterRegistry {
        &mut self.formatters
    }

    /// Register a view and make its type addressable.
    pub fn register(&mut self, view: DetailViewDef) -> Result<()> {
        let type_key = view.type_key().clone();
        if self.views.contains_key(&type_key) {
            return Err(Error::Config(format!(
                "a detail view is already registered for {type_key}"
            )));
        }
        self.routes.register(type_key.clone());
        info!(
            target: event_names::VIEW_REGISTERED,
            type_key = %type_key,
            producers = view.producer_names().count() as u64,
            "detail view registered"
        );
        self.views.insert(type_key, view);
        Ok(())
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn views(&self) -> impl Iterator<Item = &DetailViewDef> {
        self.views.values()
    }

    /// Fresh pass with the site's defaults.
    pub fn render_pass(&self) -> RenderPass<'_> {
        RenderPass::new(ValueResolver::new(
            &self.formatters,
            &self.autolink,
            &self.routes,
        ))
        .with_defaults(
            self.config.table_limit(),
            self.config.default_placeholder.clone(),
        )
    }

    pub fn dispatcher<'s>(&'s self) -> FragmentDispatcher<'s, impl Fn() -> RenderPass<'s> + 's> {
        FragmentDispatcher::new(&self.views, self.store.as_ref(), self.renderer.as_ref(), || {
            self.render_pass()
        })
    }

    fn load(&self, type_key: &TypeKey, object_id: &ObjectId) -> Result<(&DetailViewDef, ObjectRef)> {
        let not_found = || Error::ObjectNotFound {
            type_key: type_key.clone(),
            id: object_id.clone(),
        };
        let view = self.views.get(type_key).ok_or_else(not_found)?;
        let subject = self
            .store
            .fetch_object(type_key, object_id)
            .ok_or_else(not_found)?;
        Ok((view, subject))
    }

    /// Build the page model without rendering it.
    pub fn build_detail(&self, type_key: &TypeKey, object_id: &ObjectId) -> Result<DetailPage> {
        let (view, subject) = self.load(type_key, object_id)?;
        let mut pass = self.render_pass();
        view.build_page(&mut pass, &subject)
    }

    /// Render the full detail page for one object.
    pub fn render_detail(&self, type_key: &TypeKey, object_id: &ObjectId) -> Result<String> {
        let (view, subject) = self.load(type_key, object_id)?;
        let mut pass = self.render_pass();
        let page = view.build_page(&mut pass, &subject)?;

        let lazy_urls = page
            .layout
            .lazy_fragments()
            .map(|fragment| -> Result<(String, String)> {
                let url = self.routes.lazy_route(subject.as_ref(), &fragment.lazy_key)?;
                Ok((fragment.lazy_key.clone(), url))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let html = self.renderer.render_template(&TemplateContext::DetailPage {
            page: &page,
            lazy_urls: &lazy_urls,
        })?;
        info!(
            target: event_names::PAGE_RENDERED,
            type_key = %type_key,
            object_id = %object_id,
            lazy_panels = lazy_urls.len() as u64,
            "detail page rendered"
        );
        Ok(html)
    }

    /// Render one lazy fragment on demand.
    pub fn render_fragment(
        &self,
        type_key: &TypeKey,
        object_id: &ObjectId,
        fragment_key: &str,
    ) -> Result<String> {
        let fragment = self.dispatcher().dispatch(type_key, object_id, fragment_key)?;
        info!(
            target: event_names::FRAGMENT_DISPATCHED,
            type_key = %type_key,
            object_id = %object_id,
            fragment_key,
            template = fragment.template,
            "fragment rendered"
        );
        Ok(fragment.html)
    }

    /// Answer one GET request path.
    pub fn handle(&self, path: &str) -> SiteResponse {
        let ctx = LogContext::generate();
        let span = ctx.span(Stage::Serve);
        let _guard = span.enter();

        let bare = path.split(['?', '#']).next().unwrap_or_default();
        let response = if bare == HEALTH_PATH {
            SiteResponse::text(200, "ok")
        } else {
            match self.routes.resolve(path) {
                None => SiteResponse::text(404, "Not Found"),
                Some(RouteMatch::Detail {
                    type_key,
                    object_id,
                }) => SiteResponse::from_result(self.render_detail(&type_key, &object_id)),
                Some(RouteMatch::LazyFragment {
                    type_key,
                    object_id,
                    fragment_key,
                }) => SiteResponse::from_result(self.render_fragment(
                    &type_key,
                    &object_id,
                    &fragment_key,
                )),
            }
        };

        log_event!(
            ctx,
            DEBUG,
            event_names::REQUEST_HANDLED,
            Stage::Serve,
            "request handled",
            path = bare,
            status = u64::from(response.status)
        );
        response
    }
}
