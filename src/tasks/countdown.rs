//! Countdown background task

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinSet,
    time::{interval_at, Instant},
};
use tracing::{debug, info};

use super::notice_dismissal::dismiss_notice_after;
use crate::{
    services::{run_expiry_action, ExpiryHook, Submitter},
    state::{
        countdown::{ClockDisplay, Threshold, Tick},
        events::TimerEvent,
        session::SessionShared,
    },
};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Everything the task needs once the countdown reaches zero
pub struct ExpiryPlan {
    pub hook: Option<ExpiryHook>,
    pub submission_id: Option<u64>,
    pub submitter: Arc<dyn Submitter>,
    pub landing_path: String,
    pub notice_duration: Duration,
}

/// Drive one countdown: tick every second while running, announce warnings,
/// and run the expiry action once the countdown reaches zero.
///
/// The task ends after the expiry action and the last notice dismissal have
/// completed, or when it is aborted by the owning session.
pub async fn countdown_task(
    shared: Arc<SessionShared>,
    mut pause_rx: watch::Receiver<bool>,
    plan: ExpiryPlan,
) {
    let mut dismissals = JoinSet::new();

    let warning = shared.countdown().take_warning();
    if let Some(threshold) = warning {
        announce(&shared, &mut dismissals, threshold, plan.notice_duration);
    }

    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);

    // Set whenever the pause flag changed since the last tick, even if the
    // pause itself was never observed. The interval restarts on resume.
    let mut pause_changed = *pause_rx.borrow_and_update();

    loop {
        if pause_changed {
            pause_changed = false;
            debug!("Countdown task waiting for resume");
            let resumed = pause_rx.wait_for(|paused| !*paused).await.is_ok();
            if !resumed {
                debug!("Session handle dropped while paused");
                return;
            }
            interval.reset();

            let warning = shared.countdown().take_warning();
            if let Some(threshold) = warning {
                announce(&shared, &mut dismissals, threshold, plan.notice_duration);
            }
            continue;
        }

        tokio::select! {
            // A pending pause/resume must win over a tick that is due at the
            // same moment
            biased;

            changed = pause_rx.changed() => {
                if changed.is_err() {
                    debug!("Session handle dropped, stopping countdown");
                    return;
                }
                pause_changed = true;
            }

            _ = interval.tick() => {
                let tick = shared.countdown().tick();
                match tick {
                    Tick::Suspended => {}
                    Tick::Counted { remaining_seconds, warning } => {
                        let snapshot = shared.refresh();
                        if let ClockDisplay::Counting { clock, severity, .. } = snapshot.display {
                            shared.publish(TimerEvent::Tick { remaining_seconds, clock, severity });
                        }
                        if let Some(threshold) = warning {
                            announce(&shared, &mut dismissals, threshold, plan.notice_duration);
                        }
                    }
                    Tick::Expired => break,
                }
            }
        }
    }

    info!("Countdown expired (submission={:?})", plan.submission_id);
    shared.refresh();
    shared.publish(TimerEvent::Expired);

    let outcome = run_expiry_action(
        plan.hook,
        plan.submission_id,
        plan.submitter.as_ref(),
        &plan.landing_path,
    )
    .await;
    shared.set_outcome(outcome.clone());
    if let Some(event) = TimerEvent::from_outcome(&outcome) {
        shared.publish(event);
    }

    while dismissals.join_next().await.is_some() {}
    shared.mark_finished();
    debug!("Countdown task finished");
}

fn announce(
    shared: &Arc<SessionShared>,
    dismissals: &mut JoinSet<()>,
    threshold: Threshold,
    notice_duration: Duration,
) {
    let notice = shared.notices().show(threshold);
    info!("Warning: {}", notice.message);
    dismissals.spawn(dismiss_notice_after(Arc::clone(shared), notice.id, notice_duration));
    shared.publish(TimerEvent::Warning { notice });
}
