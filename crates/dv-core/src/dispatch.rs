//! View definitions and on-demand fragment dispatch.
//!
//! A fragment request names a type, an object id and a fragment key. The
//! dispatcher loads the object, replays only the producer registered under
//! `lazy_<key>`, and renders only that fragment's context.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dv_common::{
    DetailPage, Error, Layout, MenuItem, Object, ObjectId, ObjectRef, Panel, Result, TypeKey,
};
use dv_render::{TemplateContext, TemplateRenderer};
use tracing::{debug, warn};

use crate::lazy::RenderPass;

/// Source of objects by identity.
pub trait ObjectStore: Send + Sync {
    fn fetch_object(&self, type_key: &TypeKey, object_id: &ObjectId) -> Option<ObjectRef>;
}

/// Builds the page layout for one subject.
pub type LayoutFn = Arc<dyn Fn(&mut RenderPass<'_>, &ObjectRef) -> Result<Layout> + Send + Sync>;

/// Builds one lazy panel for one subject.
pub type Producer = Arc<dyn Fn(&mut RenderPass<'_>, &ObjectRef) -> Result<Panel> + Send + Sync>;

/// Page title for one subject.
pub type TitleFn = Arc<dyn Fn(&dyn Object) -> String + Send + Sync>;

/// Name a lazy key's producer is registered under.
pub fn producer_name(fragment_key: &str) -> String {
    format!("lazy_{fragment_key}")
}

/// Declarative detail view for one type.
#[derive(Clone)]
pub struct DetailViewDef {
    type_key: TypeKey,
    title: Option<TitleFn>,
    layout: LayoutFn,
    producers: BTreeMap<String, Producer>,
    menu: Vec<MenuItem>,
}

impl DetailViewDef {
    pub fn new<F>(type_key: TypeKey, layout: F) -> Self
    where
        F: Fn(&mut RenderPass<'_>, &ObjectRef) -> Result<Layout> + Send + Sync + 'static,
    {
        DetailViewDef {
            type_key,
            title: None,
            layout: Arc::new(layout),
            producers: BTreeMap::new(),
            menu: Vec::new(),
        }
    }

    /// Override the page title; defaults to the subject's label.
    pub fn title<F>(mut self, title: F) -> Self
    where
        F: Fn(&dyn Object) -> String + Send + Sync + 'static,
    {
        self.title = Some(Arc::new(title));
        self
    }

    /// Register the producer for `fragment_key`.
    pub fn lazy<F>(mut self, fragment_key: &str, producer: F) -> Self
    where
        F: Fn(&mut RenderPass<'_>, &ObjectRef) -> Result<Panel> + Send + Sync + 'static,
    {
        self.producers
            .insert(producer_name(fragment_key), Arc::new(producer));
        self
    }

    pub fn menu_item(mut self, item: MenuItem) -> Self {
        self.menu.push(item);
        self
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn producer(&self, fragment_key: &str) -> Option<&Producer> {
        self.producers.get(&producer_name(fragment_key))
    }

    /// Registered producer names, sorted.
    pub fn producer_names(&self) -> impl Iterator<Item = &str> {
        self.producers.keys().map(String::as_str)
    }

    /// Run the layout function for `subject`.
    pub fn build_page(&self, pass: &mut RenderPass<'_>, subject: &ObjectRef) -> Result<DetailPage> {
        let layout = (self.layout)(pass, subject)?;
        for fragment in layout.lazy_fragments() {
            if self.producer(&fragment.lazy_key).is_none() {
                warn!(
                    type_key = %self.type_key,
                    lazy_key = %fragment.lazy_key,
                    "lazy panel has no producer; its fragment request will 404"
                );
            }
        }
        let title = match &self.title {
            Some(title) => title(subject.as_ref()),
            None => subject.label(),
        };
        Ok(DetailPage {
            title,
            layout,
            menu: self.menu.clone(),
        })
    }
}

impl fmt::Debug for DetailViewDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailViewDef")
            .field("type_key", &self.type_key)
            .field("producers", &self.producers.keys().collect::<Vec<_>>())
            .field("menu", &self.menu)
            .finish()
    }
}

/// Dispatch progress; every transition is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    ObjectLoaded,
    ProducerInvoked,
    Rendered,
    NotFound,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DispatchState::Received => "received",
            DispatchState::ObjectLoaded => "object_loaded",
            DispatchState::ProducerInvoked => "producer_invoked",
            DispatchState::Rendered => "rendered",
            DispatchState::NotFound => "not_found",
        })
    }
}

/// A rendered on-demand fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub fragment_key: String,
    /// Template the fragment was rendered with.
    pub template: &'static str,
    pub panel: Panel,
    pub html: String,
}

/// Serves fragment requests for a set of view definitions.
pub struct FragmentDispatcher<'a, P>
where
    P: Fn() -> RenderPass<'a>,
{
    views: &'a BTreeMap<TypeKey, DetailViewDef>,
    store: &'a dyn ObjectStore,
    renderer: &'a dyn TemplateRenderer,
    new_pass: P,
}

impl<'a, P> FragmentDispatcher<'a, P>
where
    P: Fn() -> RenderPass<'a>,
{
    /// `new_pass` must hand out a fresh pass on every call.
    pub fn new(
        views: &'a BTreeMap<TypeKey, DetailViewDef>,
        store: &'a dyn ObjectStore,
        renderer: &'a dyn TemplateRenderer,
        new_pass: P,
    ) -> Self {
        FragmentDispatcher {
            views,
            store,
            renderer,
            new_pass,
        }
    }

    pub fn dispatch(
        &self,
        type_key: &TypeKey,
        object_id: &ObjectId,
        fragment_key: &str,
    ) -> Result<Fragment> {
        let result = self.run(type_key, object_id, fragment_key);
        if let Err(err) = &result {
            if err.is_not_found() {
                transition(DispatchState::NotFound, fragment_key);
            }
        }
        result
    }

    fn run(&self, type_key: &TypeKey, object_id: &ObjectId, fragment_key: &str) -> Result<Fragment> {
        transition(DispatchState::Received, fragment_key);

        let not_found = || Error::ObjectNotFound {
            type_key: type_key.clone(),
            id: object_id.clone(),
        };
        let view = self.views.get(type_key).ok_or_else(not_found)?;
        let subject = self
            .store
            .fetch_object(type_key, object_id)
            .ok_or_else(not_found)?;
        transition(DispatchState::ObjectLoaded, fragment_key);

        let producer = view
            .producer(fragment_key)
            .ok_or_else(|| Error::FragmentNotFound {
                type_key: type_key.clone(),
                producer: producer_name(fragment_key),
            })?;

        let mut pass = (self.new_pass)();
        let panel = producer(&mut pass, &subject).map_err(|source| {
            Error::ProducerFailed {
                key: fragment_key.to_string(),
                source: Box::new(source),
            }
        })?;
        transition(DispatchState::ProducerInvoked, fragment_key);

        let context = match &panel {
            Panel::Table(table) => TemplateContext::ObjectList { object_list: table },
            Panel::Record(record) => TemplateContext::ObjectDetails {
                object_details: record,
            },
            Panel::Lazy(inner) => {
                return Err(Error::ProducerFailed {
                    key: fragment_key.to_string(),
                    source: Box::new(Error::Config(format!(
                        "producer returned another lazy fragment '{}'",
                        inner.lazy_key
                    ))),
                })
            }
        };
        let template = context.name();
        let html = self.renderer.render_template(&context)?;
        transition(DispatchState::Rendered, fragment_key);

        Ok(Fragment {
            fragment_key: fragment_key.to_string(),
            template,
            panel,
            html,
        })
    }
}

fn transition(state: DispatchState, fragment_key: &str) {
    debug!(state = %state, fragment_key, "dispatch transition");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autolink::AutolinkPolicy;
    use crate::builder::{LazyLoad, TableOptions};
    use crate::format::FormatterRegistry;
    use crate::resolve::ValueResolver;
    use crate::routes::Routes;
    use dv_common::{col, Value};
    use dv_render::RenderError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Team {
        id: u64,
    }

    #[derive(Debug)]
    struct Member(u64);

    impl Object for Team {
        fn type_key(&self) -> TypeKey {
            TypeKey::new("org", "team")
        }
        fn object_id(&self) -> ObjectId {
            ObjectId::from(self.id)
        }
        fn label(&self) -> String {
            format!("Team {}", self.id)
        }
        fn attr(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(Value::Int(self.id as i64)),
                _ => None,
            }
        }
    }

    impl Object for Member {
        fn type_key(&self) -> TypeKey {
            TypeKey::new("org", "member")
        }
        fn object_id(&self) -> ObjectId {
            ObjectId::from(self.0)
        }
        fn label(&self) -> String {
            format!("Member {}", self.0)
        }
        fn attr(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(Value::Int(self.0 as i64)),
                _ => None,
            }
        }
    }

    struct TeamStore(ObjectRef);

    impl ObjectStore for TeamStore {
        fn fetch_object(&self, type_key: &TypeKey, object_id: &ObjectId) -> Option<ObjectRef> {
            (self.0.type_key() == *type_key && self.0.object_id() == *object_id)
                .then(|| self.0.clone())
        }
    }

    /// Records which contexts it was asked to render.
    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Mutex<Vec<&'static str>>,
    }

    impl TemplateRenderer for RecordingRenderer {
        fn render_template(&self, context: &TemplateContext<'_>) -> dv_render::Result<String> {
            self.rendered.lock().unwrap().push(context.name());
            match context {
                TemplateContext::ObjectList { object_list } => {
                    Ok(format!("<table rows={}>", object_list.rows.len()))
                }
                TemplateContext::ObjectDetails { .. } => Ok("<dl>".to_string()),
                TemplateContext::DetailPage { .. } => {
                    Err(RenderError::MissingData("page not expected".to_string()))
                }
            }
        }
    }

    fn team_view(calls: Arc<AtomicUsize>) -> DetailViewDef {
        DetailViewDef::new(TypeKey::new("org", "team"), |pass, _subject| {
            let empty: Vec<ObjectRef> = Vec::new();
            let panel = pass.table_for(
                &empty,
                &[col("id")],
                TableOptions::new().lazy(LazyLoad::new("members")),
            )?;
            Ok(Layout::new().row(vec![Some(panel)]))
        })
        .lazy("members", move |pass, subject| {
            calls.fetch_add(1, Ordering::SeqCst);
            let team = subject.label();
            let members: Vec<ObjectRef> = (1..=3).map(|i| Arc::new(Member(i)) as ObjectRef).collect();
            pass.table_for(&members, &[col("id")], TableOptions::new().panel_name(team))
        })
        .lazy("summary", |pass, subject| {
            pass.details_for(subject, &[dv_common::detail("id")], Default::default())
        })
        .lazy("broken", |_, _| Err(Error::Config("boom".to_string())))
        .lazy("nested", |pass, subject| {
            pass.details_for(
                subject,
                &[dv_common::detail("id")],
                crate::builder::DetailsOptions::new().lazy(LazyLoad::new("again")),
            )
        })
    }

    struct Harness {
        formatters: FormatterRegistry,
        autolink: AutolinkPolicy,
        routes: Routes,
        views: BTreeMap<TypeKey, DetailViewDef>,
        store: TeamStore,
        renderer: RecordingRenderer,
        calls: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new() -> Self {
            let calls = Arc::new(AtomicUsize::new(0));
            let view = team_view(calls.clone());
            let mut routes = Routes::new("admin");
            routes.register(view.type_key().clone());
            let mut views = BTreeMap::new();
            views.insert(view.type_key().clone(), view);
            Harness {
                formatters: FormatterRegistry::default(),
                autolink: AutolinkPolicy::default(),
                routes,
                views,
                store: TeamStore(Arc::new(Team { id: 7 })),
                renderer: RecordingRenderer::default(),
                calls,
            }
        }

        fn dispatch(&self, id: u64, key: &str) -> Result<Fragment> {
            let dispatcher = FragmentDispatcher::new(&self.views, &self.store, &self.renderer, || {
                RenderPass::new(ValueResolver::new(
                    &self.formatters,
                    &self.autolink,
                    &self.routes,
                ))
            });
            dispatcher.dispatch(&TypeKey::new("org", "team"), &ObjectId::from(id), key)
        }
    }

    #[test]
    fn test_table_fragment_renders_object_list_only() {
        let harness = Harness::new();
        let fragment = harness.dispatch(7, "members").unwrap();
        assert_eq!(fragment.template, "object_list.html");
        assert_eq!(fragment.html, "<table rows=3>");
        assert_eq!(fragment.panel.panel_name(), Some("Team 7"));
        assert_eq!(*harness.renderer.rendered.lock().unwrap(), ["object_list.html"]);
        assert_eq!(harness.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_record_fragment_renders_object_details() {
        let harness = Harness::new();
        let fragment = harness.dispatch(7, "summary").unwrap();
        assert_eq!(fragment.template, "object_details.html");
        let record = fragment.panel.as_record().unwrap();
        assert_eq!(record.subject.as_ref().unwrap().label(), "Team 7");
    }

    #[test]
    fn test_unknown_fragment_key_is_not_found() {
        let harness = Harness::new();
        let err = harness.dispatch(7, "nonexistent").unwrap_err();
        match &err {
            Error::FragmentNotFound { producer, .. } => assert_eq!(producer, "lazy_nonexistent"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.http_status(), 404);
        assert!(harness.renderer.rendered.lock().unwrap().is_empty());
        assert_eq!(harness.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_object_is_not_found() {
        let harness = Harness::new();
        let err = harness.dispatch(99, "members").unwrap_err();
        assert!(matches!(err, Error::ObjectNotFound { .. }));
        assert_eq!(harness.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_producer_failure_is_500_class() {
        let harness = Harness::new();
        let err = harness.dispatch(7, "broken").unwrap_err();
        assert!(matches!(err, Error::ProducerFailed { ref key, .. } if key == "broken"));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_producer_returning_lazy_is_a_failure() {
        let harness = Harness::new();
        let err = harness.dispatch(7, "nested").unwrap_err();
        assert!(matches!(err, Error::ProducerFailed { .. }));
    }

    #[test]
    fn test_repeat_dispatch_uses_fresh_pass() {
        let harness = Harness::new();
        harness.dispatch(7, "members").unwrap();
        harness.dispatch(7, "members").unwrap();
        assert_eq!(harness.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_build_page_defaults_title_to_label() {
        let harness = Harness::new();
        let view = &harness.views[&TypeKey::new("org", "team")];
        let mut pass = RenderPass::new(ValueResolver::new(
            &harness.formatters,
            &harness.autolink,
            &harness.routes,
        ));
        let team: ObjectRef = Arc::new(Team { id: 7 });
        let page = view.build_page(&mut pass, &team).unwrap();
        assert_eq!(page.title, "Team 7");
        assert_eq!(page.layout.lazy_fragments().count(), 1);
        assert!(pass.keys().contains("members"));
        let names: Vec<&str> = view.producer_names().collect();
        assert_eq!(names, vec!["lazy_broken", "lazy_members", "lazy_nested", "lazy_summary"]);
    }
}
