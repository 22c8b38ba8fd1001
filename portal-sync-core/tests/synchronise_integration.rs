use std::collections::HashMap;
use std::path::PathBuf;

use portal_sync_core::config::PortalConfig;
use portal_sync_core::content::{LocalApiProduct, LocalPage, PortalContent};
use portal_sync_core::contract::{
    ApiError, Customization, MockPortalApi, RemoteApiProduct, RemoteApiSpec, RemoteApiVersion,
    RemotePage,
};
use portal_sync_core::synchronise::{
    sync_api_versions, sync_pages, synchronise, SyncError, SyncPhase, UpsertAction,
};

const PORTAL: &str = "portal-1";

fn page(url: &str, title: &str, visibility: &str) -> LocalPage {
    LocalPage {
        url: url.to_string(),
        title: Some(title.to_string()),
        visibility: Some(visibility.to_string()),
        published: Some(true),
        content: format!("\n# {title}\n\n"),
        file_path: PathBuf::from(format!("pages{url}.md")),
    }
}

fn api_product(title: &str, version: &str) -> LocalApiProduct {
    LocalApiProduct {
        title: title.to_string(),
        description: Some(format!("{title} API")),
        version: version.to_string(),
        document: format!("info:\n  title: {title}\n  version: {version}\n"),
        file_path: PathBuf::from("apis/x/openapi.yaml"),
    }
}

fn content(pages: Vec<LocalPage>, apis: Vec<LocalApiProduct>) -> PortalContent {
    PortalContent {
        config: PortalConfig {
            portal_id: PORTAL.to_string(),
            api_base_url: None,
            menu: None,
        },
        pages,
        customization: Customization::default(),
        apis,
    }
}

fn remote_page(id: &str, path: &str) -> RemotePage {
    RemotePage {
        id: id.to_string(),
        path: path.to_string(),
        title: None,
    }
}

#[tokio::test]
async fn first_run_creates_every_resource_once() {
    let mut local = content(
        vec![
            page("/pricing-info", "Pricing", "public"),
            page("/about", "About", "private"),
        ],
        vec![api_product("Payments", "2.1.0")],
    );
    local.customization = Customization {
        css: Some("body {}".into()),
        robots: Some("User-agent: *".into()),
    };
    local.config.menu = Some(Default::default());

    let mut api = MockPortalApi::new();

    api.expect_list_pages()
        .withf(|portal| portal == PORTAL)
        .times(1)
        .returning(|_| Ok(vec![]));
    api.expect_create_page()
        .times(2)
        .returning(|_, body| Ok(remote_page(&format!("page{}", body.path), &body.path)));

    api.expect_update_customization()
        .withf(|_, c| c.css.as_deref() == Some("body {}") && c.robots.is_some())
        .times(1)
        .returning(|_, _| Ok(()));
    api.expect_update_menu().times(1).returning(|_, _| Ok(()));

    api.expect_list_api_products().times(1).returning(|| Ok(vec![]));
    api.expect_create_api_product()
        .withf(|body| body.name == "Payments")
        .times(1)
        .returning(|body| {
            Ok(RemoteApiProduct {
                id: "prod-1".into(),
                name: body.name.clone(),
                description: body.description.clone(),
            })
        });

    api.expect_list_api_versions()
        .withf(|product| product == "prod-1")
        .times(1)
        .returning(|_| Ok(vec![]));
    api.expect_create_api_version()
        .withf(|product, body| product == "prod-1" && body.name == "v2")
        .times(1)
        .returning(|_, body| {
            Ok(RemoteApiVersion {
                id: "ver-1".into(),
                name: body.name.clone(),
            })
        });

    api.expect_list_api_specs()
        .withf(|product, version| product == "prod-1" && version == "ver-1")
        .times(1)
        .returning(|_, _| Ok(vec![]));
    api.expect_create_api_spec()
        .withf(|_, version, body| version == "ver-1" && body.name == "openapi.yaml")
        .times(1)
        .returning(|_, _, body| {
            Ok(RemoteApiSpec {
                id: "spec-1".into(),
                name: Some(body.name.clone()),
            })
        });

    let report = synchronise(PORTAL, &local, &api)
        .await
        .expect("first run should succeed");

    assert_eq!(report.created(), 5);
    assert_eq!(report.updated(), 0);
    assert!(report.customization_pushed);
    assert!(report.menu_pushed);
    assert_eq!(report.pages[0].key, "/pricing-info");
    assert_eq!(report.api_versions[0].version.remote_id, "ver-1");
    assert_eq!(report.api_versions[0].spec.remote_id, "spec-1");
}

#[tokio::test]
async fn rerun_against_unchanged_remote_only_updates() {
    let local = content(
        vec![page("/pricing", "Pricing", "public")],
        vec![api_product("Payments", "2.1.0")],
    );

    // No create expectations: any create call fails the test.
    let mut api = MockPortalApi::new();
    api.expect_list_pages()
        .returning(|_| Ok(vec![remote_page("p-1", "/pricing"), remote_page("p-9", "/other")]));
    api.expect_update_page()
        .withf(|portal, id, body| {
            portal == PORTAL
                && id == "p-1"
                && body.title.as_deref() == Some("Pricing")
                && body.content == "# Pricing"
                && body.public
        })
        .times(1)
        .returning(|_, id, body| Ok(remote_page(id, &body.path)));

    api.expect_list_api_products().returning(|| {
        Ok(vec![RemoteApiProduct {
            id: "prod-1".into(),
            name: "Payments".into(),
            description: None,
        }])
    });
    api.expect_update_api_product()
        .withf(|id, _| id == "prod-1")
        .times(1)
        .returning(|id, body| {
            Ok(RemoteApiProduct {
                id: id.to_string(),
                name: body.name.clone(),
                description: body.description.clone(),
            })
        });

    api.expect_list_api_versions().returning(|_| {
        Ok(vec![
            RemoteApiVersion {
                id: "ver-1".into(),
                name: "v1".into(),
            },
            RemoteApiVersion {
                id: "ver-2".into(),
                name: "v2".into(),
            },
        ])
    });
    api.expect_update_api_version()
        .withf(|product, version, body| product == "prod-1" && version == "ver-2" && body.name == "v2")
        .times(1)
        .returning(|_, id, body| {
            Ok(RemoteApiVersion {
                id: id.to_string(),
                name: body.name.clone(),
            })
        });

    api.expect_list_api_specs().returning(|_, _| {
        Ok(vec![
            RemoteApiSpec {
                id: "spec-a".into(),
                name: Some("openapi.yaml".into()),
            },
            RemoteApiSpec {
                id: "spec-b".into(),
                name: None,
            },
        ])
    });
    api.expect_update_api_spec()
        .withf(|_, version, spec, _| version == "ver-2" && spec == "spec-a")
        .times(1)
        .returning(|_, _, id, body| {
            Ok(RemoteApiSpec {
                id: id.to_string(),
                name: Some(body.name.clone()),
            })
        });

    let report = synchronise(PORTAL, &local, &api)
        .await
        .expect("rerun should succeed");

    assert_eq!(report.created(), 0);
    assert_eq!(report.updated(), 4);
    assert!(!report.customization_pushed);
    assert!(!report.menu_pushed);
}

#[tokio::test]
async fn duplicate_local_paths_create_once_then_update() {
    let pages = vec![page("/dup", "First", "public"), page("/dup", "Second", "public")];

    let mut api = MockPortalApi::new();
    api.expect_list_pages().returning(|_| Ok(vec![]));
    api.expect_create_page()
        .times(1)
        .returning(|_, body| Ok(remote_page("new-id", &body.path)));
    api.expect_update_page()
        .withf(|_, id, body| id == "new-id" && body.title.as_deref() == Some("Second"))
        .times(1)
        .returning(|_, id, body| Ok(remote_page(id, &body.path)));

    let reports = sync_pages(PORTAL, &pages, &api).await.unwrap();
    assert_eq!(reports[0].action, UpsertAction::Created);
    assert_eq!(reports[1].action, UpsertAction::Updated);
}

#[tokio::test]
async fn failed_remote_call_aborts_remaining_phases() {
    let local = content(
        vec![page("/a", "A", "public"), page("/b", "B", "public")],
        vec![api_product("Payments", "1.0.0")],
    );

    let mut api = MockPortalApi::new();
    api.expect_list_pages().returning(|_| Ok(vec![]));
    api.expect_create_page()
        .times(1)
        .returning(|_, _| Err::<RemotePage, ApiError>("HTTP 403 Forbidden".into()));
    // list_api_products has no expectation: reaching it would panic.

    let err = synchronise(PORTAL, &local, &api).await.unwrap_err();
    match &err {
        SyncError::Remote { phase, key, .. } => {
            assert_eq!(*phase, SyncPhase::Pages);
            assert_eq!(key, "/a");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn version_sync_requires_known_product_id() {
    let apis = vec![api_product("Orphan", "1.0.0")];
    let api = MockPortalApi::new();

    let err = sync_api_versions(&apis, &HashMap::new(), &api)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::UnknownProduct { ref title } if title == "Orphan"));
}

#[tokio::test]
async fn new_version_under_existing_product_is_created() {
    let apis = vec![api_product("Payments", "3.0.0")];
    let ids = HashMap::from([("Payments".to_string(), "prod-1".to_string())]);

    let mut api = MockPortalApi::new();
    api.expect_list_api_versions().returning(|_| {
        Ok(vec![RemoteApiVersion {
            id: "ver-2".into(),
            name: "v2".into(),
        }])
    });
    api.expect_create_api_version()
        .withf(|_, body| body.name == "v3")
        .times(1)
        .returning(|_, body| {
            Ok(RemoteApiVersion {
                id: "ver-3".into(),
                name: body.name.clone(),
            })
        });
    api.expect_list_api_specs()
        .withf(|_, version| version == "ver-3")
        .returning(|_, _| Ok(vec![]));
    api.expect_create_api_spec()
        .times(1)
        .returning(|_, _, _| {
            Ok(RemoteApiSpec {
                id: "spec-3".into(),
                name: None,
            })
        });

    let reports = sync_api_versions(&apis, &ids, &api).await.unwrap();
    assert_eq!(reports[0].version.key, "v3");
    assert_eq!(reports[0].version.action, UpsertAction::Created);
    assert_eq!(reports[0].spec.action, UpsertAction::Created);
}
