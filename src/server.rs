/// HTTP server setup and routing
use crate::{
    api::middleware::track_http_metrics,
    context::AppContext,
    error::{PortfolioError, PortfolioResult},
    metrics,
};
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    let cors = build_cors(&ctx.config.service.allowed_origins);

    Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(crate::api::routes())
        .with_state(ctx)
        .route_layer(middleware::from_fn(track_http_metrics))
        // Outermost first: trace, compress, then CORS
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .fallback(not_found)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Prometheus scrape endpoint
async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> PortfolioResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Portfolio service listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());
    info!("   Content backend: {}", ctx.content.backend_tag());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PortfolioError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| PortfolioError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ServerConfig, content::InMemoryContentStore};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use serde_json::Value;
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;

    fn seeded_store() -> Arc<InMemoryContentStore> {
        Arc::new(InMemoryContentStore::new(vec![
            json!({ "_type": "project", "_id": "p1", "title": "Atlas", "_createdAt": "2024-03-01T00:00:00Z", "tags": ["Web", "Rust"] }),
            json!({ "_type": "project", "_id": "p2", "title": "Shell", "_createdAt": "2024-02-01T00:00:00Z", "tags": ["CLI"] }),
            json!({ "_type": "skills", "_id": "s1", "name": "Rust", "category": "Languages" }),
            json!({ "_type": "skills", "_id": "s2", "name": "Docker", "category": "Tooling" }),
        ]))
    }

    fn test_app(store: Arc<InMemoryContentStore>, config: ServerConfig) -> Router {
        build_router(AppContext::with_content(config, store))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn mount(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["sessionId"].as_str().unwrap().to_string()
    }

    async fn wait_for_section(app: &Router, session: &str, section: &str) -> Value {
        let uri = format!("/api/sessions/{}/sections/{}", session, section);
        loop {
            let (status, body) = send(app, Method::GET, &uri, None).await;
            assert_eq!(status, StatusCode::OK);
            if body["phase"] != "loading" && body["phase"] != "idle" {
                return body;
            }
            tokio::task::yield_now().await;
        }
    }

    async fn fill_form(app: &Router, session: &str) {
        let uri = format!("/api/sessions/{}/contact/fields", session);
        for (field, value) in [
            ("fullName", "Ada Lovelace"),
            ("emailAddress", "ada@example.com"),
            ("messageContent", "I would love to talk about your work."),
        ] {
            let (status, _) = send(
                app,
                Method::PUT,
                &uri,
                Some(json!({ "field": field, "value": value })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, Method::GET, "/health/live", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "alive");
    }

    #[tokio::test]
    async fn test_readiness_follows_store() {
        let store = seeded_store();
        let app = test_app(store.clone(), ServerConfig::for_tests());

        let (status, body) = send(&app, Method::GET, "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content_backend"], "memory");

        store.set_fail_fetches(true);
        let (status, body) = send(&app, Method::GET, "/health/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        send(&app, Method::GET, "/health", None).await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("http_requests_total"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        let (status, body) = send(&app, Method::GET, "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        let uri = format!("/api/sessions/{}/contact", uuid::Uuid::new_v4());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_mounted_sections_load() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        let session = mount(&app).await;

        let projects = wait_for_section(&app, &session, "projects").await;
        assert_eq!(projects["phase"], "success");
        assert_eq!(projects["categories"], json!(["All", "Web", "Rust", "CLI"]));
        assert_eq!(projects["items"].as_array().unwrap().len(), 2);
        assert_eq!(projects["items"][0]["title"], "Atlas");

        let skills = wait_for_section(&app, &session, "skills").await;
        assert_eq!(skills["categories"], json!(["All", "Tooling", "Languages"]));
    }

    #[tokio::test]
    async fn test_skill_category_applies_immediately() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        let session = mount(&app).await;
        wait_for_section(&app, &session, "skills").await;

        let uri = format!("/api/sessions/{}/sections/skills/category", session);
        let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "category": "Tooling" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "applied");
        assert_eq!(body["section"]["selectedCategory"], "Tooling");
        assert_eq!(body["section"]["items"][0]["name"], "Docker");

        let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "category": "Tooling" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "unchanged");
    }

    #[tokio::test]
    async fn test_project_category_is_scheduled() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        let session = mount(&app).await;
        wait_for_section(&app, &session, "projects").await;

        let uri = format!("/api/sessions/{}/sections/projects/category", session);
        let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "category": "CLI" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "scheduled");
        assert_eq!(body["section"]["transitioning"], true);
        assert!(body["section"]["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_section_is_rejected() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        let session = mount(&app).await;

        let uri = format!("/api/sessions/{}/sections/blog", session);
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let store = seeded_store();
        store.set_fail_fetches(true);
        let app = test_app(store.clone(), ServerConfig::for_tests());
        let session = mount(&app).await;

        let projects = wait_for_section(&app, &session, "projects").await;
        assert_eq!(projects["phase"], "error");
        assert_eq!(projects["canRetry"], true);

        store.set_fail_fetches(false);
        let uri = format!("/api/sessions/{}/sections/projects/retry", session);
        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "success");

        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Conflict");
    }

    #[tokio::test]
    async fn test_contact_flow() {
        let store = seeded_store();
        let app = test_app(store.clone(), ServerConfig::for_tests());
        let session = mount(&app).await;

        let submit_uri = format!("/api/sessions/{}/contact/submit", session);
        let (status, body) = send(&app, Method::POST, &submit_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "invalid");
        assert_eq!(body["form"]["errors"]["fullName"], "Your name is required");
        assert_eq!(store.create_calls(), 0);

        fill_form(&app, &session).await;
        let (status, body) = send(&app, Method::POST, &submit_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "submitted");
        assert_eq!(body["form"]["phase"], "submitted");
        assert_eq!(body["form"]["readOnly"], true);
        assert_eq!(store.create_calls(), 1);

        let fields_uri = format!("/api/sessions/{}/contact/fields", session);
        let (status, _) = send(
            &app,
            Method::PUT,
            &fields_uri,
            Some(json!({ "field": "fullName", "value": "Grace" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let reset_uri = format!("/api/sessions/{}/contact/reset", session);
        let (status, body) = send(&app, Method::POST, &reset_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "editing");
        assert_eq!(body["fields"]["fullName"], "");
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_fields() {
        let store = seeded_store();
        store.set_fail_creates(true);
        let app = test_app(store, ServerConfig::for_tests());
        let session = mount(&app).await;
        fill_form(&app, &session).await;

        let uri = format!("/api/sessions/{}/contact/submit", session);
        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "failed");
        assert_eq!(body["form"]["phase"], "editing");
        assert_eq!(body["form"]["fields"]["fullName"], "Ada Lovelace");
        assert!(body["form"]["errors"]["submission"].is_string());
    }

    #[tokio::test]
    async fn test_submissions_are_rate_limited() {
        let mut config = ServerConfig::for_tests();
        config.rate_limit.submissions_per_minute = 1;
        let app = test_app(seeded_store(), config);

        let first = mount(&app).await;
        fill_form(&app, &first).await;
        let uri = format!("/api/sessions/{}/contact/submit", first);
        let (status, _) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let second = mount(&app).await;
        fill_form(&app, &second).await;
        let uri = format!("/api/sessions/{}/contact/submit", second);
        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "RateLimitExceeded");

        // The limited form is still editable
        let (_, form) = send(&app, Method::GET, &format!("/api/sessions/{}/contact", second), None).await;
        assert_eq!(form["phase"], "editing");
    }

    #[tokio::test]
    async fn test_dropped_submit_request_still_settles() {
        let store = Arc::new(
            InMemoryContentStore::default().with_latency(Duration::from_millis(200)),
        );
        let app = test_app(store.clone(), ServerConfig::for_tests());
        let session = mount(&app).await;
        fill_form(&app, &session).await;

        // Client gives up while the create call is in flight
        let submit_uri = format!("/api/sessions/{}/contact/submit", session);
        let request = send(&app, Method::POST, &submit_uri, None);
        assert!(tokio::time::timeout(Duration::from_millis(20), request).await.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let form_uri = format!("/api/sessions/{}/contact", session);
        let (status, form) = send(&app, Method::GET, &form_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(form["phase"], "submitted");
        assert_eq!(store.create_calls(), 1);

        let reset_uri = format!("/api/sessions/{}/contact/reset", session);
        let (status, _) = send(&app, Method::POST, &reset_uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dropped_failing_submit_returns_to_editing() {
        let store = Arc::new(
            InMemoryContentStore::default().with_latency(Duration::from_millis(200)),
        );
        store.set_fail_creates(true);
        let app = test_app(store, ServerConfig::for_tests());
        let session = mount(&app).await;
        fill_form(&app, &session).await;

        let submit_uri = format!("/api/sessions/{}/contact/submit", session);
        let request = send(&app, Method::POST, &submit_uri, None);
        assert!(tokio::time::timeout(Duration::from_millis(20), request).await.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        let form_uri = format!("/api/sessions/{}/contact", session);
        let (_, form) = send(&app, Method::GET, &form_uri, None).await;
        assert_eq!(form["phase"], "editing");
        assert_eq!(form["fields"]["fullName"], "Ada Lovelace");
        assert!(form["errors"]["submission"].is_string());

        // Still editable
        let fields_uri = format!("/api/sessions/{}/contact/fields", session);
        let (status, _) = send(
            &app,
            Method::PUT,
            &fields_uri,
            Some(json!({ "field": "fullName", "value": "Ada King" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_by_default() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://visitor.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_unmount_session() {
        let app = test_app(seeded_store(), ServerConfig::for_tests());
        let session = mount(&app).await;

        let uri = format!("/api/sessions/{}", session);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
