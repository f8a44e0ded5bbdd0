//! Bounded time-window selection over an uploaded audio clip.
//!
//! The selector holds `(duration, start, end)`. The duration arrives
//! asynchronously from whatever decodes the audio, so until
//! [`RangeSelector::on_ready`] is called the window is the nominal `[0, 30]`
//! and adjustments are ignored.
//!
//! Every adjustment clamps the requested value to the clip bounds first and
//! only then checks the window length. Rejected adjustments leave the window
//! untouched and report `false`; nothing is surfaced as an error.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Longest selectable window, in seconds
pub const MAX_WINDOW_SECS: f64 = 30.0;

/// A selected sub-range of an uploaded clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioClipSelection {
    /// Reference returned by the upload endpoint
    pub source_url: String,
    pub start: f64,
    pub end: f64,
}

impl AudioClipSelection {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone)]
pub struct RangeSelector {
    source_url: String,
    duration: Option<f64>,
    start: f64,
    end: f64,
}

impl RangeSelector {
    /// Selector for a freshly uploaded clip whose duration is not known yet
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            duration: None,
            start: 0.0,
            end: MAX_WINDOW_SECS,
        }
    }

    /// Record the decoded duration and reset the window to `[0, min(30, duration)]`.
    pub fn on_ready(&mut self, duration: f64) {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };

        self.duration = Some(duration);
        self.start = 0.0;
        self.end = duration.min(MAX_WINDOW_SECS);
    }

    pub fn is_ready(&self) -> bool {
        self.duration.is_some()
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Move the window start. Returns whether the change was applied.
    pub fn set_start(&mut self, value: f64) -> bool {
        let Some(duration) = self.duration else {
            return false;
        };
        if !value.is_finite() {
            return false;
        }

        let candidate = value.clamp(0.0, duration);
        if candidate > self.end || self.end - candidate > MAX_WINDOW_SECS {
            trace!(start = candidate, end = self.end, "Rejected start adjustment");
            return false;
        }

        self.start = candidate;
        true
    }

    /// Move the window end. Returns whether the change was applied.
    pub fn set_end(&mut self, value: f64) -> bool {
        let Some(duration) = self.duration else {
            return false;
        };
        if !value.is_finite() {
            return false;
        }

        // start <= end <= duration holds, so the clamp bounds are ordered
        let candidate = value.clamp(self.start, duration);
        if candidate - self.start > MAX_WINDOW_SECS {
            trace!(start = self.start, end = candidate, "Rejected end adjustment");
            return false;
        }

        self.end = candidate;
        true
    }

    /// Current window as a selection on this clip
    pub fn selection(&self) -> AudioClipSelection {
        AudioClipSelection {
            source_url: self.source_url.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// Render seconds as `m:ss`, truncating fractions.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
