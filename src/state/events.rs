//! Events published by a running timer session

use serde::Serialize;

use super::{countdown::Severity, notices::Notice};
use crate::services::ExpiryOutcome;

/// Something the embedding view should react to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Tick {
        remaining_seconds: u64,
        clock: String,
        severity: Severity,
    },
    Paused {
        remaining_seconds: u64,
    },
    Resumed {
        remaining_seconds: u64,
    },
    Warning {
        notice: Notice,
    },
    NoticeDismissed {
        notice_id: u32,
    },
    Expired,
    AutoSubmitted {
        message: String,
        redirect_to: String,
    },
    ManualSubmissionRequired {
        message: String,
    },
}

impl TimerEvent {
    /// Event name, matching the serialized `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            TimerEvent::Tick { .. } => "tick",
            TimerEvent::Paused { .. } => "paused",
            TimerEvent::Resumed { .. } => "resumed",
            TimerEvent::Warning { .. } => "warning",
            TimerEvent::NoticeDismissed { .. } => "notice_dismissed",
            TimerEvent::Expired => "expired",
            TimerEvent::AutoSubmitted { .. } => "auto_submitted",
            TimerEvent::ManualSubmissionRequired { .. } => "manual_submission_required",
        }
    }

    /// User-facing event for an expiry outcome, if it has one
    pub fn from_outcome(outcome: &ExpiryOutcome) -> Option<Self> {
        match outcome {
            ExpiryOutcome::AutoSubmitted { message, redirect_to } => Some(TimerEvent::AutoSubmitted {
                message: message.clone(),
                redirect_to: redirect_to.clone(),
            }),
            ExpiryOutcome::ManualSubmissionRequired { message, .. } => {
                Some(TimerEvent::ManualSubmissionRequired { message: message.clone() })
            }
            ExpiryOutcome::HookCompleted | ExpiryOutcome::NoAction => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_type_tag() {
        let event = TimerEvent::Tick {
            remaining_seconds: 59,
            clock: "00:59".to_string(),
            severity: Severity::Normal,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "tick", "remaining_seconds": 59, "clock": "00:59", "severity": "normal" })
        );
        assert_eq!(event.name(), "tick");
        assert_eq!(serde_json::to_value(TimerEvent::Expired).unwrap(), json!({ "type": "expired" }));
    }
}
