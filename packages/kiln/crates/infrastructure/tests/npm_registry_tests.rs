use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use domain::{RegistryClient, RegistryError, VersionResolver};
use infrastructure::NpmRegistry;
use serde_json::json;
use std::time::Duration;

async fn package(Path(name): Path<String>) -> impl IntoResponse {
    match name.as_str() {
        "@kiln-cli/init" => (
            StatusCode::OK,
            Json(json!({
                "name": "@kiln-cli/init",
                "dist-tags": { "latest": "1.10.0" },
                "versions": {
                    "1.0.0": {},
                    "1.2.0": {},
                    "1.10.0": {},
                    "2.0.0-beta": {}
                }
            })),
        ),
        "unpublished" => (StatusCode::OK, Json(json!({ "name": "unpublished" }))),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))),
    }
}

async fn serve() -> String {
    let app = Router::new().route("/:name", get(package));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_fetches_scoped_package_versions() {
    let base = serve().await;
    let registry = NpmRegistry::new(&base, Duration::from_secs(5)).unwrap();

    let mut versions = registry.fetch_versions("@kiln-cli/init").await.unwrap();
    versions.sort();
    assert_eq!(versions, vec!["1.0.0", "1.10.0", "1.2.0", "2.0.0-beta"]);

    let resolver = VersionResolver::new(registry);
    assert_eq!(
        resolver.resolve_latest("@kiln-cli/init").await.unwrap(),
        "2.0.0-beta"
    );
}

#[tokio::test]
async fn test_missing_versions_field_is_empty() {
    let base = serve().await;
    let registry = NpmRegistry::new(&base, Duration::from_secs(5)).unwrap();

    assert!(registry.fetch_versions("unpublished").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_not_found_is_unavailable() {
    let base = serve().await;
    let registry = NpmRegistry::new(&base, Duration::from_secs(5)).unwrap();

    let err = registry.fetch_versions("nope").await.unwrap_err();
    assert!(matches!(err, RegistryError::Unavailable { ref name, .. } if name == "nope"));
}

#[tokio::test]
async fn test_unreachable_registry_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let registry = NpmRegistry::new(&format!("http://{addr}/"), Duration::from_secs(2)).unwrap();
    let err = registry.fetch_versions("@kiln-cli/init").await.unwrap_err();
    assert!(matches!(err, RegistryError::Unavailable { .. }));
}
