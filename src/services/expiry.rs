//! Expiry action run once when a countdown reaches zero

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{info, warn};

use super::submission::Submitter;

/// Confirmation shown after a successful fallback submission
pub const AUTO_SUBMITTED_MESSAGE: &str =
    "Time expired! Your assessment has been automatically submitted.";

/// Instruction shown when the fallback submission fails
pub const MANUAL_SUBMIT_MESSAGE: &str =
    "Time expired! There was an issue auto-submitting. Please submit manually.";

/// Completion hook supplied by the embedding view
pub type ExpiryHook = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// Wrap an async closure as an [`ExpiryHook`]
pub fn expiry_hook<F, Fut>(hook: F) -> ExpiryHook
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Box::new(move || Box::pin(hook()))
}

/// What the expiry action ended up doing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpiryOutcome {
    /// The completion hook ran successfully
    HookCompleted,
    /// Fallback submission succeeded; the view should navigate away
    AutoSubmitted { message: String, redirect_to: String },
    /// Fallback submission failed; the candidate must submit manually
    ManualSubmissionRequired { message: String, reason: String },
    /// No hook and no submission to submit
    NoAction,
}

/// Run the expiry action.
///
/// A failed hook falls through to the fallback submission so that an
/// attempt is always made when the submission is known.
pub async fn run_expiry_action(
    hook: Option<ExpiryHook>,
    submission_id: Option<u64>,
    submitter: &dyn Submitter,
    landing_path: &str,
) -> ExpiryOutcome {
    if let Some(hook) = hook {
        match hook().await {
            Ok(()) => {
                info!("Expiry hook completed");
                return ExpiryOutcome::HookCompleted;
            }
            Err(e) => warn!("Expiry hook failed: {:#}, falling back to auto-submission", e),
        }
    }

    let Some(submission_id) = submission_id else {
        info!("Countdown expired with nothing to submit");
        return ExpiryOutcome::NoAction;
    };

    match submitter.submit(submission_id).await {
        Ok(()) => ExpiryOutcome::AutoSubmitted {
            message: AUTO_SUBMITTED_MESSAGE.to_string(),
            redirect_to: landing_path.to_string(),
        },
        Err(e) => {
            warn!("Auto-submission of {} failed: {}", submission_id, e);
            ExpiryOutcome::ManualSubmissionRequired {
                message: MANUAL_SUBMIT_MESSAGE.to_string(),
                reason: e.to_string(),
            }
        }
    }
}
