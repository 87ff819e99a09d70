//! Transient warning notices shown while a countdown runs

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::countdown::Threshold;

/// A warning raised when the countdown crosses a threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u32,
    pub threshold_seconds: u64,
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

/// Currently visible notices for one session
#[derive(Debug, Default, Clone)]
pub struct Notices {
    next_id: u32,
    visible: Vec<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notice for `threshold` and return it
    pub fn show(&mut self, threshold: Threshold) -> Notice {
        self.next_id += 1;
        let notice = Notice {
            id: self.next_id,
            threshold_seconds: threshold.seconds,
            message: threshold.message.to_string(),
            shown_at: Utc::now(),
        };
        self.visible.push(notice.clone());
        notice
    }

    /// Remove a notice. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u32) -> bool {
        let before = self.visible.len();
        self.visible.retain(|notice| notice.id != id);
        self.visible.len() != before
    }

    pub fn visible(&self) -> &[Notice] {
        &self.visible
    }
}
