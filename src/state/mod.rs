//! State management module
//!
//! The countdown state machine, the per-session handle around it, and the
//! service-wide registry of sessions.

pub mod app_state;
pub mod countdown;
pub mod events;
pub mod notices;
pub mod session;

// Re-export main types
pub use app_state::{AppState, Checkpoint, MountRequest, RetentionPolicy};
pub use countdown::{ClockDisplay, Countdown, CountdownSnapshot, Phase, Severity, Tick};
pub use events::TimerEvent;
pub use notices::{Notice, Notices};
pub use session::{SessionOptions, SessionSettings, TimerSession};
