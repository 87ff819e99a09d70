//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};
use super::responses::{CreateSessionRequest, HealthResponse, SessionView, StatusResponse};

/// Handle POST /sessions - Mount a countdown (or reattach to a live one)
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let (id, created) = state.mount(request.into())?;
    let view = state.with_session(id, |session| SessionView::new(id, session))?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(view)))
}

/// Handle GET /sessions - List live sessions
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let mut views = state.map_sessions(SessionView::new)?;
    views.sort_by_key(|view| view.created_at);
    Ok(Json(views))
}

/// Handle GET /sessions/:id - Current view of one session
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state.with_session(id, |session| SessionView::new(id, session))?;
    Ok(Json(view))
}

/// Handle POST /sessions/:id/pause
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    state.pause(id)?;
    info!("Session {} paused", id);
    get_session_handler(State(state), Path(id)).await
}

/// Handle POST /sessions/:id/resume
pub async fn resume_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    state.resume(id)?;
    info!("Session {} resumed", id);
    get_session_handler(State(state), Path(id)).await
}

/// Handle DELETE /sessions/:id - Unmount and stop the countdown
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.unmount(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /sessions/:id/events - Server-Sent Events stream
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let rx = state.subscribe(id)?;

    let events = stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = match Event::default().event(event.name()).json_data(&event) {
                        Ok(sse) => sse,
                        Err(e) => {
                            warn!("Failed to encode {} event: {}", event.name(), e);
                            continue;
                        }
                    };
                    return Some((Ok(sse), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream for session {} skipped {} events", id, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Handle GET /status - Service status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        sessions: state.session_count(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
