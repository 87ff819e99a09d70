//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions", post(create_session_handler).get(list_sessions_handler))
        .route("/sessions/:id", get(get_session_handler).delete(delete_session_handler))
        .route("/sessions/:id/pause", post(pause_handler))
        .route("/sessions/:id/resume", post(resume_handler))
        .route("/sessions/:id/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        // The assessment front-end is served from a different origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{expiry::tests::MockSubmitter, Submitter},
        state::SessionSettings,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use futures::StreamExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn router() -> Router {
        let submitter: Arc<dyn Submitter> = MockSubmitter::succeeding();
        let state = AppState::new(0, "127.0.0.1".to_string(), submitter, SessionSettings::default());
        create_router(Arc::new(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_returns_initial_view() {
        let app = router();
        let response = send(
            &app,
            "POST",
            "/sessions",
            Some(json!({ "time_limit_minutes": 1, "submission_id": 123 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["remaining_seconds"], 60);
        assert_eq!(body["phase"], "running");
        assert_eq!(body["submission_id"], 123);
        assert_eq!(body["display"]["state"], "counting");
        assert_eq!(body["display"]["clock"], "01:00");
        assert_eq!(body["display"]["badge"], "HURRY!");
        assert!(body["outcome"].is_null());
    }

    #[tokio::test]
    async fn remount_for_same_submission_reattaches() {
        let app = router();
        let body = Some(json!({ "time_limit_minutes": 30, "submission_id": 5 }));
        let first = json_body(send(&app, "POST", "/sessions", body.clone()).await).await;

        let response = send(&app, "POST", "/sessions", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let second = json_body(response).await;
        assert_eq!(first["id"], second["id"]);
    }

    #[tokio::test]
    async fn invalid_time_limit_is_bad_request() {
        let app = router();
        let response = send(&app, "POST", "/sessions", Some(json!({ "time_limit_minutes": 0 }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid time limit"));
    }

    #[tokio::test]
    async fn pause_resume_and_delete() {
        let app = router();
        let created = json_body(
            send(&app, "POST", "/sessions", Some(json!({ "time_limit_minutes": 2 }))).await,
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let paused = json_body(send(&app, "POST", &format!("/sessions/{}/pause", id), None).await).await;
        assert_eq!(paused["phase"], "paused");

        let resumed = json_body(send(&app, "POST", &format!("/sessions/{}/resume", id), None).await).await;
        assert_eq!(resumed["phase"], "running");

        let listed = json_body(send(&app, "GET", "/sessions", None).await).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let deleted = send(&app, "DELETE", &format!("/sessions/{}", id), None).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = send(&app, "GET", &format!("/sessions/{}", id), None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = router();
        let id = uuid::Uuid::new_v4();
        for (method, uri) in [
            ("GET", format!("/sessions/{}", id)),
            ("POST", format!("/sessions/{}/pause", id)),
            ("DELETE", format!("/sessions/{}", id)),
            ("GET", format!("/sessions/{}/events", id)),
        ] {
            let response = send(&app, method, &uri, None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} {}", method, uri);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn event_stream_carries_named_json_frames_until_unmount() {
        let app = router();
        let created = json_body(
            send(&app, "POST", "/sessions", Some(json!({ "time_limit_minutes": 0.2 }))).await,
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let response = send(&app, "GET", &format!("/sessions/{}/events", id), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");

        let mut frames = response.into_body().into_data_stream();
        let mut text = String::new();
        while !text.contains("event: expired") {
            let chunk = frames.next().await.unwrap().unwrap();
            text.push_str(std::str::from_utf8(&chunk).unwrap());
        }

        assert!(text.contains("event: tick\ndata: {\"type\":\"tick\""));
        assert!(text.contains("\"remaining_seconds\":11"));
        assert!(text.contains("event: warning\n"));
        assert!(text.contains("\"threshold_seconds\":10"));
        assert!(text.contains("data: {\"type\":\"expired\"}"));

        let deleted = send(&app, "DELETE", &format!("/sessions/{}", id), None).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let ended = tokio::time::timeout(Duration::from_secs(60), async {
            while let Some(chunk) = frames.next().await {
                chunk.unwrap();
            }
        })
        .await;
        assert!(ended.is_ok());
    }

    #[tokio::test]
    async fn health_and_status() {
        let app = router();
        let health = json_body(send(&app, "GET", "/health", None).await).await;
        assert_eq!(health["status"], "ok");

        let status = json_body(send(&app, "GET", "/status", None).await).await;
        assert_eq!(status["sessions"], 0);
        assert!(status["last_action"].is_null());
    }
}
