use actix_web::{dev::ServerHandle, web, App, HttpRequest, HttpResponse, HttpServer};
use cartographer::{
    discovery::{Discoverer, DiscoveryError, DiscoveryOptions, DiscoveryStatus, FetchErrorCause},
    k8s_client::{api::cluster_config::ClusterConfig, ClientOptions, K8sClient},
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
enum Reply {
    Json(Value),
    Status(u16),
    Hang,
}

type Routes = HashMap<&'static str, Reply>;

async fn respond(req: HttpRequest, routes: web::Data<Routes>) -> HttpResponse {
    match routes.get(req.path()) {
        Some(Reply::Json(body)) => HttpResponse::Ok().content_type("application/json").body(body.to_string()),
        Some(Reply::Status(status)) => {
            let status = actix_web::http::StatusCode::from_u16(*status).unwrap();
            HttpResponse::build(status).finish()
        }
        Some(Reply::Hang) => {
            actix_web::rt::time::sleep(Duration::from_secs(30)).await;
            HttpResponse::Ok().finish()
        }
        None => HttpResponse::NotFound().body("404 page not found"),
    }
}

/// Serves `routes` on an ephemeral port, returning the server URL.
fn serve(routes: Routes) -> (String, ServerHandle) {
    let routes = web::Data::new(routes);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(routes.clone())
            .default_service(web::route().to(respond))
    })
    .workers(2)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (format!("http://{}", addr), handle)
}

fn group_list(group_versions: &[&str]) -> Reply {
    let groups = group_versions
        .iter()
        .map(|group_version| {
            let (group, version) = group_version.split_once('/').unwrap();
            let version = json!({"groupVersion": group_version, "version": version});
            json!({"name": group, "versions": [version], "preferredVersion": version})
        })
        .collect::<Vec<_>>();
    Reply::Json(json!({"kind": "APIGroupList", "apiVersion": "v1", "groups": groups}))
}

fn resource_list(group_version: &str, resources: Value) -> Reply {
    Reply::Json(json!({"kind": "APIResourceList", "groupVersion": group_version, "resources": resources}))
}

fn cluster() -> Routes {
    let mut routes = Routes::new();
    routes.insert("/apis", group_list(&["apps/v1", "batch/v1"]));
    routes.insert(
        "/api/v1",
        resource_list(
            "v1",
            json!([
                {"name": "pods", "singularName": "pod", "namespaced": true, "kind": "Pod", "verbs": ["list", "get"], "shortNames": ["po"]},
                {"name": "namespaces", "singularName": "", "namespaced": false, "kind": "Namespace", "verbs": ["get"], "shortNames": ["ns"]}
            ]),
        ),
    );
    routes.insert(
        "/apis/apps/v1",
        resource_list(
            "apps/v1",
            json!([
                {"name": "deployments", "singularName": "deployment", "namespaced": true, "kind": "Deployment", "verbs": ["list", "get", "create"], "shortNames": ["deploy"]}
            ]),
        ),
    );
    routes.insert(
        "/apis/batch/v1",
        resource_list(
            "batch/v1",
            json!([
                {"name": "jobs", "singularName": "job", "namespaced": true, "kind": "Job", "verbs": ["get", "list"]}
            ]),
        ),
    );
    routes
}

fn discoverer(server: &str) -> Discoverer<K8sClient> {
    let client_options = ClientOptions {
        request_timeout: Duration::from_millis(500),
        retry_max_elapsed: Some(Duration::from_secs(1)),
        https_only: false,
    };
    let client = K8sClient::new(ClusterConfig::anonymous(server), &client_options).unwrap();
    Discoverer::new(
        Arc::new(client),
        DiscoveryOptions {
            max_in_flight: 2,
            request_timeout: Duration::from_millis(300),
            timeout: Some(Duration::from_secs(10)),
        },
    )
}

#[actix_web::test]
async fn discovers_every_group_version() {
    let (server, handle) = serve(cluster());
    let discovery = discoverer(&server).discover(&CancellationToken::new()).await.unwrap();
    handle.stop(false).await;

    assert_eq!(discovery.status(), DiscoveryStatus::Complete);
    let registry = discovery.registry();
    assert_eq!(
        registry.group_versions().collect::<Vec<_>>(),
        vec!["v1", "apps/v1", "batch/v1"]
    );
    assert_eq!(registry.len(), 4);
    assert_eq!(registry.resource("v1", "pods").unwrap().kind, "Pod");
    assert_eq!(registry.resource("v1", "namespaces").unwrap().singular_name, "namespace");
    assert!(!registry.resource("v1", "namespaces").unwrap().namespaced);
    let verbs = registry
        .resource("apps/v1", "deployments")
        .unwrap()
        .verbs
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>();
    assert_eq!(verbs, vec!["create", "get", "list"]);
    assert_eq!(registry.find("deploy")[0].0, "apps/v1");
}

#[actix_web::test]
async fn unchanged_cluster_gives_equal_registries() {
    let (server, handle) = serve(cluster());
    let discoverer = discoverer(&server);
    let first = discoverer.discover(&CancellationToken::new()).await.unwrap();
    let second = discoverer.discover(&CancellationToken::new()).await.unwrap();
    handle.stop(false).await;

    assert_eq!(first.registry(), second.registry());
}

#[actix_web::test]
async fn slow_endpoint_is_reported_not_fatal() {
    let mut routes = cluster();
    routes.insert("/apis/batch/v1", Reply::Hang);
    let (server, handle) = serve(routes);
    let discovery = discoverer(&server).discover(&CancellationToken::new()).await.unwrap();
    handle.stop(false).await;

    assert_eq!(discovery.status(), DiscoveryStatus::Partial);
    assert_eq!(discovery.registry().len(), 3);
    assert!(discovery.registry().resource("apps/v1", "deployments").is_some());
    assert_eq!(discovery.fetch_errors().len(), 1);
    let fetch_error = &discovery.fetch_errors()[0];
    assert_eq!(fetch_error.endpoint.group_version, "batch/v1");
    assert_eq!(fetch_error.endpoint.url, format!("{}/apis/batch/v1", server));
    assert!(matches!(fetch_error.cause, FetchErrorCause::Timeout(_)));
}

#[actix_web::test]
async fn forbidden_endpoint_is_reported() {
    let mut routes = cluster();
    routes.insert("/apis/apps/v1", Reply::Status(403));
    let (server, handle) = serve(routes);
    let discovery = discoverer(&server).discover(&CancellationToken::new()).await.unwrap();
    handle.stop(false).await;

    assert_eq!(discovery.status(), DiscoveryStatus::Partial);
    assert!(discovery.registry().resource("batch/v1", "jobs").is_some());
    assert!(matches!(
        discovery.fetch_errors()[0].cause,
        FetchErrorCause::Status(status) if status.as_u16() == 403
    ));
}

#[actix_web::test]
async fn duplicate_resource_fails_the_run() {
    let mut routes = cluster();
    routes.insert(
        "/apis/batch/v1",
        resource_list(
            "batch/v1",
            json!([
                {"name": "jobs", "namespaced": true, "kind": "Job", "verbs": ["get"]},
                {"name": "jobs", "namespaced": true, "kind": "Job", "verbs": ["list"]}
            ]),
        ),
    );
    let (server, handle) = serve(routes);
    let result = discoverer(&server).discover(&CancellationToken::new()).await;
    handle.stop(false).await;

    match result {
        Err(DiscoveryError::Duplicate(err)) => {
            assert_eq!(err.group_version, "batch/v1");
            assert_eq!(err.name, "jobs");
        }
        other => panic!("expected duplicate error, got {:?}", other.map(|d| d.status())),
    }
}

#[actix_web::test]
async fn missing_group_list_fails_the_run() {
    let mut routes = cluster();
    routes.remove("/apis");
    let (server, handle) = serve(routes);
    let result = discoverer(&server).discover(&CancellationToken::new()).await;
    handle.stop(false).await;

    assert!(matches!(result, Err(DiscoveryError::GroupList(_))));
}
