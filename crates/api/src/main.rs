use adrotate_core::config::Settings;
use adrotate_db::PgRotationStore;
use axum::{middleware::from_fn, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

mod error;
mod middleware;
mod routes;
mod state;

use crate::middleware::request_id::request_id;
use crate::state::AppState;

fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_router(state.clone()))
        .merge(routes::v1_router(state))
        .layer(from_fn(request_id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()?;

    let db = adrotate_db::connect(&settings.database_url, settings.db_max_connections).await?;
    adrotate_db::migrate(&db).await?;

    let state = AppState {
        store: Arc::new(PgRotationStore::new(db)),
        adrotate_env: settings.adrotate_env.clone(),
    };

    let addr: SocketAddr = settings.api_bind.parse()?;

    info!(%addr, env = %state.adrotate_env, "starting api");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adrotate_core::store::memory::MemoryStore;
    use adrotate_core::testing::{date, issue, link, module, sponsor, unit_in};
    use adrotate_core::types::SelectionPolicy;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;
    use tracing_test::traced_test;

    async fn seeded() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_module(module("mod_1", "pub_1", SelectionPolicy::Sequential, 1)).await;
        store.insert_module(module("mod_2", "pub_1", SelectionPolicy::Manual, 2)).await;
        for (id, order) in [("a", 1), ("b", 2)] {
            store.insert_sponsor(sponsor(id)).await;
            store.insert_link(link("mod_1", id, order)).await;
            store.insert_unit(unit_in("mod_1", &format!("u_{id}"), id, 1)).await;
        }
        store.insert_unit(unit_in("mod_2", "u_manual", "b", 1)).await;
        store.insert_issue(issue("iss_1", "pub_1", date("2025-06-02"))).await;
        Arc::new(store)
    }

    fn test_app(store: Arc<MemoryStore>) -> Router {
        app(AppState {
            store,
            adrotate_env: "test".to_string(),
        })
    }

    async fn call(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        assert!(response.headers().contains_key("X-Request-Id"));
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = call(test_app(seeded().await), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["env"], "test");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let request = Request::builder()
            .uri("/health")
            .header("X-Request-Id", "req_fromcli01")
            .body(Body::empty())
            .unwrap();
        let response = test_app(seeded().await).oneshot(request).await.unwrap();
        assert_eq!(response.headers()["X-Request-Id"], "req_fromcli01");
    }

    #[tokio::test]
    async fn test_set_cursor_rejects_position_below_one() {
        let (status, json) = call(
            test_app(seeded().await),
            Method::PUT,
            "/v1/modules/mod_1/cursor",
            Some(serde_json::json!({ "position": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_position");
    }

    #[tokio::test]
    async fn test_set_and_reset_cursor() {
        let store = seeded().await;
        let (status, json) = call(
            test_app(store.clone()),
            Method::PUT,
            "/v1/modules/mod_1/cursor",
            Some(serde_json::json!({ "position": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["rotationCursor"], 2);
        assert_eq!(store.module("mod_1").await.unwrap().rotation_cursor, 2);

        let (status, _) = call(
            test_app(store.clone()),
            Method::POST,
            "/v1/modules/mod_1/cursor/reset",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.module("mod_1").await.unwrap().rotation_cursor, 1);
    }

    #[tokio::test]
    async fn test_rotation_then_confirm() {
        let store = seeded().await;
        let (status, json) =
            call(test_app(store.clone()), Method::POST, "/v1/issues/iss_1/rotation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["skipped"], false);
        assert_eq!(json["items"][0]["sponsorId"], "a");
        assert_eq!(json["items"][1]["reason"], "manual selection required");

        let (status, json) =
            call(test_app(store.clone()), Method::POST, "/v1/issues/iss_1/confirm", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["recordedCount"], 1);
        assert_eq!(json["attemptedCount"], 1);

        let (_, json) =
            call(test_app(store.clone()), Method::POST, "/v1/issues/iss_1/confirm", None).await;
        assert_eq!(json["recordedCount"], 0);
        assert_eq!(json["attemptedCount"], 0);
    }

    #[tokio::test]
    async fn test_assign_unit_to_wrong_module() {
        let (status, json) = call(
            test_app(seeded().await),
            Method::PUT,
            "/v1/issues/iss_1/modules/mod_2/selection",
            Some(serde_json::json!({ "unitId": "u_a" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_assign_unit_and_list() {
        let store = seeded().await;
        let (status, json) = call(
            test_app(store.clone()),
            Method::PUT,
            "/v1/issues/iss_1/modules/mod_2/selection",
            Some(serde_json::json!({ "unitId": "u_manual" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["policy"], "manual");

        let (status, json) =
            call(test_app(store), Method::GET, "/v1/issues/iss_1/selections", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["items"].as_array().unwrap().len(), 1);
        assert_eq!(json["items"][0]["unitId"], "u_manual");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_store_read_failure_is_logged() {
        let store = seeded().await;
        store.fail_issue_reads("iss_1").await;

        let (status, json) =
            call(test_app(store.clone()), Method::POST, "/v1/issues/iss_1/confirm", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "internal_error");
        assert!(logs_contain("failed to load issue"));
        assert!(logs_contain("read failed for issue iss_1"));

        let (status, _) =
            call(test_app(store), Method::GET, "/v1/issues/iss_1/selections", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(logs_contain("failed to list selections"));
    }

    #[tokio::test]
    async fn test_unknown_issue_is_not_found() {
        let (status, json) = call(
            test_app(seeded().await),
            Method::POST,
            "/v1/issues/missing/rotation",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["message"], "issue not found");
    }
}
