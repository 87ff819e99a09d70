//! Background tasks module
//!
//! Tasks spawned per timer session: the one-second countdown loop and the
//! delayed removal of warning notices. One service-wide task reaps finished
//! sessions.

pub mod countdown;
pub mod notice_dismissal;
pub mod session_reaper;

// Re-export main functions
pub use countdown::{countdown_task, ExpiryPlan};
pub use notice_dismissal::dismiss_notice_after;
pub use session_reaper::session_reaper_task;
