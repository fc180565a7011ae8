//! Property tests for route derivation and inversion.

use dv_common::{ObjectId, TypeKey};
use dv_core::routes::{RouteMatch, Routes};
use proptest::prelude::*;

fn routes_for(namespace: &str, type_key: &TypeKey) -> Routes {
    let mut routes = Routes::new(namespace);
    routes.register(type_key.clone());
    routes
}

proptest! {
    #[test]
    fn detail_urls_invert_to_their_inputs(
        namespace in "[a-z][a-z0-9_-]{0,10}",
        app in "[a-z][a-z0-9_]{0,10}",
        model in "[a-z][a-z0-9_]{0,10}",
        id in "[A-Za-z0-9_-]{1,12}",
    ) {
        let type_key = TypeKey::new(app, model);
        let routes = routes_for(&namespace, &type_key);
        let object_id = ObjectId::parse(&id).unwrap();

        let url = routes.detail_url(&type_key, &object_id).unwrap();
        prop_assert_eq!(
            routes.resolve(&url),
            Some(RouteMatch::Detail { type_key, object_id })
        );
    }

    #[test]
    fn lazy_urls_invert_to_their_inputs(
        app in "[a-z][a-z0-9_]{0,10}",
        model in "[a-z][a-z0-9_]{0,10}",
        id in "[0-9]{1,9}",
        key in "[A-Za-z0-9_-]{1,16}",
    ) {
        let type_key = TypeKey::new(app, model);
        let routes = routes_for("admin", &type_key);
        let object_id = ObjectId::parse(&id).unwrap();

        let url = routes.lazy_url(&type_key, &object_id, &key).unwrap();
        let suffix = format!("/lazy/{key}/");
        prop_assert!(url.ends_with(&suffix));
        prop_assert_eq!(
            routes.resolve(&url),
            Some(RouteMatch::LazyFragment { type_key, object_id, fragment_key: key })
        );
    }

    #[test]
    fn query_strings_do_not_change_the_match(
        id in "[0-9]{1,9}",
        query in "[a-z]{1,5}=[a-z0-9]{0,5}",
    ) {
        let type_key = TypeKey::new("companies", "company");
        let routes = routes_for("admin", &type_key);
        let object_id = ObjectId::parse(&id).unwrap();
        let url = routes.detail_url(&type_key, &object_id).unwrap();

        prop_assert_eq!(routes.resolve(&format!("{url}?{query}")), routes.resolve(&url));
    }

    #[test]
    fn keys_with_path_characters_are_rejected(
        prefix in "[a-z]{1,5}",
        bad in "[/?#. ]",
    ) {
        let type_key = TypeKey::new("companies", "company");
        let routes = routes_for("admin", &type_key);
        let key = format!("{prefix}{bad}");
        prop_assert!(routes.lazy_url(&type_key, &ObjectId::from(1u64), &key).is_err());
    }
}

#[test]
fn unregistered_types_do_not_resolve() {
    let routes = routes_for("admin", &TypeKey::new("companies", "company"));
    assert_eq!(routes.resolve("/admin/companies/contact/1/"), None);
    assert!(routes
        .detail_url(&TypeKey::new("companies", "contact"), &ObjectId::from(1u64))
        .is_err());
}

#[test]
fn foreign_namespaces_do_not_resolve() {
    let routes = routes_for("admin", &TypeKey::new("companies", "company"));
    assert_eq!(routes.resolve("/backoffice/companies/company/1/"), None);
    assert_eq!(routes.resolve("/admin/companies/company/1"), None);
    assert_eq!(routes.resolve("/admin/companies/company/1/lazy/"), None);
}
