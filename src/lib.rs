//! Assessment Timer - countdown and auto-submit service for timed assessments
//!
//! A candidate taking a timed assessment sees a live `MM:SS` countdown with
//! warnings at fixed thresholds. When time runs out the session fires its
//! completion hook exactly once, or submits the candidate's attempt itself
//! through the portal's REST API.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{ApiError, SubmitError, TimerError};
pub use state::{AppState, SessionOptions, SessionSettings, TimerSession};
pub use utils::signals::shutdown_signal;
