//! Route derivation for detail pages and lazy fragments.
//!
//! Forward: `(type, id[, key])` to a URL path. Inverse: a URL path back to
//! the same triple. Only registered types are addressable in either
//! direction.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use dv_common::{Error, Object, ObjectId, Result, TypeKey};
use regex::Regex;
use serde::Serialize;
use tracing::trace;

fn lazy_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"))
}

/// Lazy keys become URL segments and producer names.
pub fn validate_lazy_key(key: &str) -> Result<()> {
    if lazy_key_pattern().is_match(key) {
        Ok(())
    } else {
        Err(Error::InvalidLazyKey {
            key: key.to_string(),
        })
    }
}

/// The two routes every registered type gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAction {
    Detail,
    LazyFragment,
}

impl RouteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteAction::Detail => "detail",
            RouteAction::LazyFragment => "lazy_fragment",
        }
    }
}

impl fmt::Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<app_label>_<model_name>_<action>`.
pub fn route_name(type_key: &TypeKey, action: RouteAction) -> String {
    type_key.route_name(action.as_str())
}

/// Result of inverting a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum RouteMatch {
    Detail {
        type_key: TypeKey,
        object_id: ObjectId,
    },
    LazyFragment {
        type_key: TypeKey,
        object_id: ObjectId,
        fragment_key: String,
    },
}

impl RouteMatch {
    pub fn action(&self) -> RouteAction {
        match self {
            RouteMatch::Detail { .. } => RouteAction::Detail,
            RouteMatch::LazyFragment { .. } => RouteAction::LazyFragment,
        }
    }
}

/// One entry of the route table, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub name: String,
    pub pattern: String,
}

/// Route table for one namespace.
#[derive(Debug, Clone)]
pub struct Routes {
    namespace: String,
    registered: BTreeSet<TypeKey>,
}

impl Routes {
    pub fn new(namespace: impl Into<String>) -> Self {
        Routes {
            namespace: namespace.into(),
            registered: BTreeSet::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Make a type addressable. Returns false if it already was.
    pub fn register(&mut self, type_key: TypeKey) -> bool {
        trace!(type_key = %type_key, "route registered");
        self.registered.insert(type_key)
    }

    pub fn is_registered(&self, type_key: &TypeKey) -> bool {
        self.registered.contains(type_key)
    }

    pub fn registered(&self) -> impl Iterator<Item = &TypeKey> {
        self.registered.iter()
    }

    fn base(&self, type_key: &TypeKey, object_id: &ObjectId) -> Result<String> {
        if !self.is_registered(type_key) {
            return Err(Error::RouteNotFound {
                type_key: type_key.clone(),
            });
        }
        Ok(format!(
            "/{}/{}/{}/{}/",
            self.namespace, type_key.app_label, type_key.model_name, object_id
        ))
    }

    /// `/<namespace>/<app>/<model>/<id>/`
    pub fn detail_url(&self, type_key: &TypeKey, object_id: &ObjectId) -> Result<String> {
        self.base(type_key, object_id)
    }

    /// `/<namespace>/<app>/<model>/<id>/lazy/<key>/`
    pub fn lazy_url(&self, type_key: &TypeKey, object_id: &ObjectId, key: &str) -> Result<String> {
        validate_lazy_key(key)?;
        Ok(format!("{}lazy/{}/", self.base(type_key, object_id)?, key))
    }

    pub fn detail_route(&self, object: &dyn Object) -> Result<String> {
        self.detail_url(&object.type_key(), &object.object_id())
    }

    pub fn lazy_route(&self, object: &dyn Object, key: &str) -> Result<String> {
        self.lazy_url(&object.type_key(), &object.object_id(), key)
    }

    /// Invert a request path. Query strings and fragments are ignored; the
    /// trailing slash is required.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let rest = path
            .strip_prefix('/')?
            .strip_prefix(self.namespace.as_str())?
            .strip_prefix('/')?
            .strip_suffix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();

        let (app, model, id, fragment_key) = match segments.as_slice() {
            [app, model, id] => (*app, *model, *id, None),
            [app, model, id, "lazy", key] => (*app, *model, *id, Some(*key)),
            _ => return None,
        };

        let type_key = TypeKey::new(app, model);
        if type_key.app_label != app || type_key.model_name != model {
            return None;
        }
        if !self.is_registered(&type_key) {
            trace!(type_key = %type_key, "path names an unregistered type");
            return None;
        }
        let object_id = ObjectId::parse(id).ok()?;

        match fragment_key {
            None => Some(RouteMatch::Detail {
                type_key,
                object_id,
            }),
            Some(key) => {
                validate_lazy_key(key).ok()?;
                Some(RouteMatch::LazyFragment {
                    type_key,
                    object_id,
                    fragment_key: key.to_string(),
                })
            }
        }
    }

    /// Named patterns for every registered type.
    pub fn table(&self) -> Vec<RouteInfo> {
        self.registered
            .iter()
            .flat_map(|key| {
                let base = format!(
                    "/{}/{}/{}/<id>/",
                    self.namespace, key.app_label, key.model_name
                );
                [
                    RouteInfo {
                        name: route_name(key, RouteAction::Detail),
                        pattern: base.clone(),
                    },
                    RouteInfo {
                        name: route_name(key, RouteAction::LazyFragment),
                        pattern: format!("{base}lazy/<fragment_key>/"),
                    },
                ]
            })
            .collect()
    }
}
