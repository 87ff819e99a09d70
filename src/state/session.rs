//! Handle owning one running countdown

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info};

use super::{
    countdown::{Countdown, CountdownSnapshot},
    events::TimerEvent,
    notices::{Notice, Notices},
};
use crate::{
    error::TimerError,
    services::{ExpiryHook, ExpiryOutcome, Submitter},
    tasks::{countdown_task, ExpiryPlan},
};

const EVENT_CAPACITY: usize = 256;

/// How to start a session
pub struct SessionOptions {
    pub time_limit_minutes: f64,
    pub submission_id: Option<u64>,
    pub paused: bool,
    pub on_expire: Option<ExpiryHook>,
    /// Resume part way through instead of starting from the full limit
    pub remaining_seconds: Option<u64>,
}

impl SessionOptions {
    pub fn new(time_limit_minutes: f64) -> Self {
        Self {
            time_limit_minutes,
            submission_id: None,
            paused: false,
            on_expire: None,
            remaining_seconds: None,
        }
    }

    pub fn submission(mut self, submission_id: u64) -> Self {
        self.submission_id = Some(submission_id);
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn on_expire(mut self, hook: ExpiryHook) -> Self {
        self.on_expire = Some(hook);
        self
    }

    pub fn remaining(mut self, remaining_seconds: u64) -> Self {
        self.remaining_seconds = Some(remaining_seconds);
        self
    }
}

/// Settings shared by every session of a service
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// How long a warning notice stays visible
    pub notice_duration: Duration,
    /// Where the view navigates after a successful auto-submission
    pub landing_path: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            notice_duration: Duration::from_secs(5),
            landing_path: "/interviewee".to_string(),
        }
    }
}

/// State shared between a session handle and its countdown task
#[derive(Debug)]
pub struct SessionShared {
    countdown: Mutex<Countdown>,
    notices: Mutex<Notices>,
    outcome: Mutex<Option<ExpiryOutcome>>,
    events: broadcast::Sender<TimerEvent>,
    snapshots: watch::Sender<CountdownSnapshot>,
    finished_at: Mutex<Option<Instant>>,
}

impl SessionShared {
    fn new(countdown: Countdown) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (snapshots, _) = watch::channel(countdown.snapshot());
        Self {
            countdown: Mutex::new(countdown),
            notices: Mutex::new(Notices::new()),
            outcome: Mutex::new(None),
            events,
            snapshots,
            finished_at: Mutex::new(None),
        }
    }

    // Critical sections never panic, so a poisoned lock still holds
    // consistent data.
    pub fn countdown(&self) -> MutexGuard<'_, Countdown> {
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notices(&self) -> MutexGuard<'_, Notices> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn outcome(&self) -> Option<ExpiryOutcome> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_outcome(&self, outcome: ExpiryOutcome) {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
    }

    /// Send an event to subscribers; having none is fine
    pub fn publish(&self, event: TimerEvent) {
        let _ = self.events.send(event);
    }

    /// Record that the countdown task has run to completion
    pub fn mark_finished(&self) {
        *self.finished_at.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    /// Time since the countdown task completed, if it has
    pub fn finished_for(&self) -> Option<Duration> {
        let finished_at = *self.finished_at.lock().unwrap_or_else(PoisonError::into_inner);
        finished_at.map(|at| at.elapsed())
    }

    /// Push the current countdown state to snapshot watchers
    pub fn refresh(&self) -> CountdownSnapshot {
        let snapshot = self.countdown().snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

/// A live countdown. Dropping the handle stops the countdown and cancels any
/// pending notice dismissal or in-flight expiry action.
#[derive(Debug)]
pub struct TimerSession {
    shared: Arc<SessionShared>,
    pause_tx: watch::Sender<bool>,
    submission_id: Option<u64>,
    created_at: DateTime<Utc>,
    task: JoinHandle<()>,
}

impl TimerSession {
    /// Create the countdown and spawn its task on the current runtime
    pub fn start(
        options: SessionOptions,
        submitter: Arc<dyn Submitter>,
        settings: &SessionSettings,
    ) -> Result<Self, TimerError> {
        let countdown = match options.remaining_seconds {
            Some(remaining) => {
                Countdown::resume_from(options.time_limit_minutes, remaining, options.paused)?
            }
            None => Countdown::new(options.time_limit_minutes, options.paused)?,
        };
        info!(
            "Starting countdown: limit={}min remaining={}s submission={:?} paused={}",
            options.time_limit_minutes,
            countdown.remaining_seconds(),
            options.submission_id,
            options.paused
        );

        let shared = Arc::new(SessionShared::new(countdown));
        let (pause_tx, pause_rx) = watch::channel(options.paused);
        let plan = ExpiryPlan {
            hook: options.on_expire,
            submission_id: options.submission_id,
            submitter,
            landing_path: settings.landing_path.clone(),
            notice_duration: settings.notice_duration,
        };
        let task = tokio::spawn(countdown_task(Arc::clone(&shared), pause_rx, plan));

        Ok(Self {
            shared,
            pause_tx,
            submission_id: options.submission_id,
            created_at: Utc::now(),
            task,
        })
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        self.shared.countdown().snapshot()
    }

    /// Pause the countdown; a no-op unless it is running
    pub fn pause(&self) -> CountdownSnapshot {
        let changed = self.shared.countdown().pause();
        if changed {
            self.pause_tx.send_replace(true);
            let snapshot = self.shared.refresh();
            debug!("Countdown paused at {}s", snapshot.remaining_seconds);
            self.shared.publish(TimerEvent::Paused {
                remaining_seconds: snapshot.remaining_seconds,
            });
        }
        self.snapshot()
    }

    /// Resume the countdown; a no-op unless it is paused
    pub fn resume(&self) -> CountdownSnapshot {
        let changed = self.shared.countdown().resume();
        if changed {
            self.pause_tx.send_replace(false);
            let snapshot = self.shared.refresh();
            debug!("Countdown resumed at {}s", snapshot.remaining_seconds);
            self.shared.publish(TimerEvent::Resumed {
                remaining_seconds: snapshot.remaining_seconds,
            });
        }
        self.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.shared.events.subscribe()
    }

    pub fn watch(&self) -> watch::Receiver<CountdownSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.shared.notices().visible().to_vec()
    }

    pub fn outcome(&self) -> Option<ExpiryOutcome> {
        self.shared.outcome()
    }

    pub fn submission_id(&self) -> Option<u64> {
        self.submission_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True once the countdown task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// How long ago the expiry action and last notice dismissal completed
    pub fn finished_for(&self) -> Option<Duration> {
        self.shared.finished_for()
    }
}

impl Drop for TimerSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}
