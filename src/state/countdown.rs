//! Countdown state machine
//!
//! A `Countdown` converts an assessment time limit into a per-second counter.
//! It is driven externally: something calls [`Countdown::tick`] once per
//! second, and the returned [`Tick`] says whether a warning threshold was
//! crossed or the countdown just expired. The machine never decides *when* to
//! tick and never performs side effects itself.

use serde::{Deserialize, Serialize};

use crate::{error::TimerError, utils::format_clock};

/// Label shown instead of the clock once time has run out
pub const EXPIRED_LABEL: &str = "TIME EXPIRED - Auto-submitting...";

/// Remaining-time values (in seconds) at which a warning notice is raised
pub const WARNING_THRESHOLDS: [Threshold; 4] = [
    Threshold { seconds: 300, message: "5 minutes remaining!" },
    Threshold { seconds: 60, message: "1 minute remaining!" },
    Threshold { seconds: 30, message: "30 seconds remaining!" },
    Threshold { seconds: 10, message: "10 seconds remaining!" },
];

/// A warning threshold and the message announced when it is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub seconds: u64,
    pub message: &'static str,
}

/// Lifecycle phase of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Running,
    Paused,
    /// Terminal: no transition leaves this phase
    Expired,
}

/// Visual severity derived from the fraction of time left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Paused or already expired; nothing changed
    Suspended,
    /// One second elapsed, possibly crossing a warning threshold
    Counted {
        remaining_seconds: u64,
        warning: Option<Threshold>,
    },
    /// This tick took the countdown to zero. Returned exactly once.
    Expired,
}

/// Countdown for a single assessment attempt
#[derive(Debug, Clone)]
pub struct Countdown {
    time_limit_minutes: f64,
    remaining_seconds: u64,
    phase: Phase,
    /// Bit `i` set once `WARNING_THRESHOLDS[i]` has been announced
    announced: u8,
}

impl Countdown {
    /// Create a countdown starting at `round(time_limit_minutes * 60)` seconds
    pub fn new(time_limit_minutes: f64, paused: bool) -> Result<Self, TimerError> {
        validate_time_limit(time_limit_minutes)?;
        let initial = (time_limit_minutes * 60.0).round() as u64;
        Ok(Self::with_remaining(time_limit_minutes, initial, paused))
    }

    /// Create a countdown that resumes part way through its time limit.
    ///
    /// `remaining_seconds` is clamped to the full limit. Thresholds above the
    /// resumed value count as already announced.
    pub fn resume_from(
        time_limit_minutes: f64,
        remaining_seconds: u64,
        paused: bool,
    ) -> Result<Self, TimerError> {
        validate_time_limit(time_limit_minutes)?;
        let initial = (time_limit_minutes * 60.0).round() as u64;
        let mut countdown =
            Self::with_remaining(time_limit_minutes, remaining_seconds.min(initial), paused);
        for (index, threshold) in WARNING_THRESHOLDS.iter().enumerate() {
            if threshold.seconds > countdown.remaining_seconds {
                countdown.announced |= 1 << index;
            }
        }
        Ok(countdown)
    }

    fn with_remaining(time_limit_minutes: f64, remaining_seconds: u64, paused: bool) -> Self {
        Self {
            time_limit_minutes,
            remaining_seconds,
            phase: if paused { Phase::Paused } else { Phase::Running },
            announced: 0,
        }
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> Tick {
        if self.phase != Phase::Running {
            return Tick::Suspended;
        }

        if self.remaining_seconds <= 1 {
            self.remaining_seconds = 0;
            self.phase = Phase::Expired;
            return Tick::Expired;
        }

        self.remaining_seconds -= 1;
        Tick::Counted {
            remaining_seconds: self.remaining_seconds,
            warning: self.take_warning(),
        }
    }

    /// Claim the warning for the current value, if one is due and not yet
    /// announced. Only a running countdown announces anything.
    pub fn take_warning(&mut self) -> Option<Threshold> {
        if self.phase != Phase::Running {
            return None;
        }
        let index = WARNING_THRESHOLDS
            .iter()
            .position(|t| t.seconds == self.remaining_seconds)?;
        if self.announced & (1 << index) != 0 {
            return None;
        }
        self.announced |= 1 << index;
        Some(WARNING_THRESHOLDS[index])
    }

    /// Pause a running countdown. Returns whether the phase changed.
    pub fn pause(&mut self) -> bool {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
            true
        } else {
            false
        }
    }

    /// Resume a paused countdown. Returns whether the phase changed.
    pub fn resume(&mut self) -> bool {
        if self.phase == Phase::Paused {
            self.phase = Phase::Running;
            true
        } else {
            false
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_expired(&self) -> bool {
        self.phase == Phase::Expired
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn time_limit_minutes(&self) -> f64 {
        self.time_limit_minutes
    }

    /// Remaining time as `MM:SS`
    pub fn clock(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    /// Severity from the fraction of the full limit still remaining
    pub fn severity(&self) -> Severity {
        let total = self.time_limit_minutes * 60.0;
        let ratio = self.remaining_seconds as f64 / total;
        if ratio <= 0.10 {
            Severity::Critical
        } else if ratio <= 0.25 {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    /// Urgency badge shown next to the clock when little time is left
    pub fn badge(&self) -> Option<&'static str> {
        match self.remaining_seconds {
            0..=60 => Some("HURRY!"),
            61..=300 => Some("Low Time"),
            _ => None,
        }
    }

    /// Point-in-time view of the countdown for rendering
    pub fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            time_limit_minutes: self.time_limit_minutes,
            display: self.display(),
        }
    }

    /// What the embedding view should render right now
    pub fn display(&self) -> ClockDisplay {
        if self.is_expired() {
            ClockDisplay::Expired { label: EXPIRED_LABEL }
        } else {
            ClockDisplay::Counting {
                clock: self.clock(),
                severity: self.severity(),
                badge: self.badge(),
            }
        }
    }
}

pub(crate) fn validate_time_limit(time_limit_minutes: f64) -> Result<(), TimerError> {
    if time_limit_minutes.is_finite() && time_limit_minutes > 0.0 {
        Ok(())
    } else {
        Err(TimerError::InvalidTimeLimit(time_limit_minutes))
    }
}

/// Rendered state of a countdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClockDisplay {
    Counting {
        clock: String,
        severity: Severity,
        badge: Option<&'static str>,
    },
    Expired {
        label: &'static str,
    },
}

/// Copy of a countdown's observable state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountdownSnapshot {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub time_limit_minutes: f64,
    pub display: ClockDisplay,
}
