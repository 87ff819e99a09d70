//! Service-wide registry of timer sessions

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    countdown::{validate_time_limit, CountdownSnapshot, Phase},
    events::TimerEvent,
    session::{SessionOptions, SessionSettings, TimerSession},
};
use crate::{error::ApiError, services::Submitter, utils::format_uptime};

/// Request to mount a countdown for an assessment view
#[derive(Debug, Clone)]
pub struct MountRequest {
    pub time_limit_minutes: f64,
    pub submission_id: Option<u64>,
    pub paused: bool,
    /// Reattach to a live session or checkpoint for the same submission
    pub resume: bool,
}

/// Last known countdown state of a submission whose session went away
#[derive(Debug, Clone, Serialize)]
pub struct Checkpoint {
    pub time_limit_minutes: f64,
    pub remaining_seconds: u64,
    pub running: bool,
    pub expired: bool,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip)]
    recorded_instant: tokio::time::Instant,
}

impl Checkpoint {
    pub fn from_snapshot(snapshot: &CountdownSnapshot) -> Self {
        Self {
            time_limit_minutes: snapshot.time_limit_minutes,
            remaining_seconds: snapshot.remaining_seconds,
            running: snapshot.phase == Phase::Running,
            expired: snapshot.phase == Phase::Expired,
            recorded_at: Utc::now(),
            recorded_instant: tokio::time::Instant::now(),
        }
    }

    /// Time since the checkpoint was recorded
    pub fn age(&self) -> Duration {
        self.recorded_instant.elapsed()
    }

    /// Remaining seconds as of now. A running countdown kept losing time
    /// while no session was attached; a paused one did not.
    pub fn remaining_now(&self) -> u64 {
        if self.running {
            self.remaining_seconds
                .saturating_sub(self.recorded_instant.elapsed().as_secs())
        } else {
            self.remaining_seconds
        }
    }
}

/// How long finished sessions and checkpoints are kept around
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    /// Grace period after expiry during which a view can still read the outcome
    pub finished_session: Duration,
    pub checkpoint: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            finished_session: Duration::from_secs(300),
            checkpoint: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Main application state: all live sessions plus reload checkpoints
pub struct AppState {
    sessions: Mutex<HashMap<Uuid, TimerSession>>,
    checkpoints: Mutex<HashMap<u64, Checkpoint>>,
    submitter: Arc<dyn Submitter>,
    settings: SessionSettings,
    retention: RetentionPolicy,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(
        port: u16,
        host: String,
        submitter: Arc<dyn Submitter>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            checkpoints: Mutex::new(HashMap::new()),
            submitter,
            settings,
            retention: RetentionPolicy::default(),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Mount a countdown. Returns the session id and whether a new session
    /// was started (false when an existing one was reattached).
    pub fn mount(&self, request: MountRequest) -> Result<(Uuid, bool), ApiError> {
        // Nothing is discarded for a request that cannot start
        validate_time_limit(request.time_limit_minutes)?;

        let mut sessions = self.lock_sessions()?;
        let mut options = SessionOptions::new(request.time_limit_minutes).paused(request.paused);

        if let Some(submission_id) = request.submission_id {
            options = options.submission(submission_id);
            let live = sessions
                .iter()
                .find(|(_, s)| s.submission_id() == Some(submission_id))
                .map(|(id, _)| *id);

            if request.resume {
                if let Some(id) = live {
                    info!("Reattaching to session {} for submission {}", id, submission_id);
                    drop(sessions);
                    self.record_action("reattach");
                    return Ok((id, false));
                }

                let checkpoint = self.lock_checkpoints()?.remove(&submission_id);
                if let Some(checkpoint) = checkpoint {
                    if checkpoint.expired {
                        self.lock_checkpoints()?.insert(submission_id, checkpoint);
                        return Err(ApiError::AlreadyExpired(submission_id));
                    }
                    let remaining = checkpoint.remaining_now();
                    info!(
                        "Resuming submission {} from checkpoint with {}s remaining",
                        submission_id, remaining
                    );
                    options.time_limit_minutes = checkpoint.time_limit_minutes;
                    options = options.remaining(remaining);
                }
            } else {
                if let Some(id) = live {
                    info!("Discarding session {} for submission {}", id, submission_id);
                    sessions.remove(&id);
                }
                self.lock_checkpoints()?.remove(&submission_id);
            }
        }

        let session = TimerSession::start(options, Arc::clone(&self.submitter), &self.settings)?;
        let id = Uuid::new_v4();
        sessions.insert(id, session);
        drop(sessions);

        info!("Mounted session {}", id);
        self.record_action("mount");
        Ok((id, true))
    }

    /// Unmount a session, stopping its countdown
    pub fn unmount(&self, id: Uuid) -> Result<(), ApiError> {
        let session = self
            .lock_sessions()?
            .remove(&id)
            .ok_or(ApiError::SessionNotFound(id))?;

        if let Some(submission_id) = session.submission_id() {
            let checkpoint = Checkpoint::from_snapshot(&session.snapshot());
            self.lock_checkpoints()?.insert(submission_id, checkpoint);
        }
        drop(session);

        info!("Unmounted session {}", id);
        self.record_action("unmount");
        Ok(())
    }

    /// Drop sessions that finished longer ago than the retention period,
    /// keeping an expired checkpoint for their submission, and forget stale
    /// checkpoints. Returns the number of sessions removed.
    pub fn reap(&self) -> Result<usize, ApiError> {
        let retention = self.retention;
        let finished: Vec<(Uuid, TimerSession)> = {
            let mut sessions = self.lock_sessions()?;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, s)| {
                    s.finished_for()
                        .is_some_and(|age| age >= retention.finished_session)
                })
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|s| (id, s)))
                .collect()
        };

        let mut checkpoints = self.lock_checkpoints()?;
        checkpoints.retain(|submission_id, checkpoint| {
            let keep = checkpoint.age() < retention.checkpoint;
            if !keep {
                debug!("Forgetting checkpoint for submission {}", submission_id);
            }
            keep
        });

        for (id, session) in &finished {
            if let Some(submission_id) = session.submission_id() {
                checkpoints.insert(submission_id, Checkpoint::from_snapshot(&session.snapshot()));
            }
            info!("Reaped finished session {}", id);
        }
        Ok(finished.len())
    }

    /// Run `f` against a live session
    pub fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&TimerSession) -> R,
    ) -> Result<R, ApiError> {
        let sessions = self.lock_sessions()?;
        let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
        Ok(f(session))
    }

    /// Run `f` against every live session
    pub fn map_sessions<R>(&self, f: impl Fn(Uuid, &TimerSession) -> R) -> Result<Vec<R>, ApiError> {
        let sessions = self.lock_sessions()?;
        Ok(sessions.iter().map(|(id, session)| f(*id, session)).collect())
    }

    pub fn pause(&self, id: Uuid) -> Result<CountdownSnapshot, ApiError> {
        let snapshot = self.with_session(id, |session| session.pause())?;
        self.record_action("pause");
        Ok(snapshot)
    }

    pub fn resume(&self, id: Uuid) -> Result<CountdownSnapshot, ApiError> {
        let snapshot = self.with_session(id, |session| session.resume())?;
        self.record_action("resume");
        Ok(snapshot)
    }

    pub fn subscribe(&self, id: Uuid) -> Result<broadcast::Receiver<TimerEvent>, ApiError> {
        self.with_session(id, |session| session.subscribe())
    }

    pub fn session_count(&self) -> usize {
        self.lock_sessions().map(|s| s.len()).unwrap_or(0)
    }

    pub fn checkpoint(&self, submission_id: u64) -> Option<Checkpoint> {
        self.lock_checkpoints()
            .ok()
            .and_then(|c| c.get(&submission_id).cloned())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    fn record_action(&self, action: &str) {
        match self.last_action.lock() {
            Ok(mut last) => *last = Some((action.to_string(), Utc::now())),
            Err(e) => warn!("Failed to record last action: {}", e),
        }
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, TimerSession>>, ApiError> {
        self.sessions
            .lock()
            .map_err(|e| ApiError::Internal(format!("Failed to lock sessions: {}", e)))
    }

    fn lock_checkpoints(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<u64, Checkpoint>>, ApiError> {
        self.checkpoints
            .lock()
            .map_err(|e| ApiError::Internal(format!("Failed to lock checkpoints: {}", e)))
    }
}
