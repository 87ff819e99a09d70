//! Auto-dismissal of warning notices

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::debug;

use crate::state::{events::TimerEvent, session::SessionShared};

/// Remove a notice once it has been visible for `delay`, regardless of what
/// the countdown is doing in the meantime
pub async fn dismiss_notice_after(shared: Arc<SessionShared>, notice_id: u32, delay: Duration) {
    sleep(delay).await;

    let dismissed = shared.notices().dismiss(notice_id);
    if dismissed {
        debug!("Notice {} dismissed", notice_id);
        shared.publish(TimerEvent::NoticeDismissed { notice_id });
    }
}
