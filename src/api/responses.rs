//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    services::ExpiryOutcome,
    state::{CountdownSnapshot, MountRequest, Notice, TimerSession},
};

/// Body of `POST /sessions`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub time_limit_minutes: f64,
    pub submission_id: Option<u64>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default = "default_resume")]
    pub resume: bool,
}

fn default_resume() -> bool {
    true
}

impl From<CreateSessionRequest> for MountRequest {
    fn from(request: CreateSessionRequest) -> Self {
        Self {
            time_limit_minutes: request.time_limit_minutes,
            submission_id: request.submission_id,
            paused: request.paused,
            resume: request.resume,
        }
    }
}

/// Everything the embedding view needs to render a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub submission_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub countdown: CountdownSnapshot,
    pub notices: Vec<Notice>,
    pub outcome: Option<ExpiryOutcome>,
}

impl SessionView {
    pub fn new(id: Uuid, session: &TimerSession) -> Self {
        Self {
            id,
            submission_id: session.submission_id(),
            created_at: session.created_at(),
            countdown: session.snapshot(),
            notices: session.notices(),
            outcome: session.outcome(),
        }
    }
}

/// Service status with session information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub sessions: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
