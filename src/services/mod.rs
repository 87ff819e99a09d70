//! External collaborators of a timer session
//!
//! The expiry policy run when a countdown reaches zero, and the REST client
//! used for the fallback auto-submission.

pub mod expiry;
pub mod submission;

// Re-export main types
pub use expiry::{
    expiry_hook, run_expiry_action, ExpiryHook, ExpiryOutcome, AUTO_SUBMITTED_MESSAGE,
    MANUAL_SUBMIT_MESSAGE,
};
pub use submission::{CredentialProvider, CredentialSource, HttpSubmitter, Submitter};
