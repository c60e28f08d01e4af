//! Booking time windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time interval `[start, end)`.
///
/// The end instant is excluded, so back-to-back windows such as
/// `[10:00, 12:00)` and `[12:00, 14:00)` do not overlap. All conflict
/// detection in the core goes through [`TimeWindow::overlaps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start of the window.
    pub start: DateTime<Utc>,

    /// Exclusive end of the window.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window from its bounds.
    ///
    /// Ordering (`start < end`) is not enforced here; the booking engine
    /// rejects unordered windows before anything is persisted.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Returns the elapsed duration `end - start`.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if the window's bounds are ordered (`start < end`).
    pub fn is_ordered(&self) -> bool {
        self.start < self.end
    }

    /// Returns true if the two half-open windows share at least one
    /// instant: `a.start < b.end && b.start < a.end`.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if the window has fully elapsed at `instant`.
    ///
    /// The end is exclusive, so a window ending exactly at `instant` has
    /// elapsed.
    pub fn has_ended_by(&self, instant: DateTime<Utc>) -> bool {
        self.end <= instant
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
