//! Period axis of the panel

use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar year on the panel's time axis
pub type Period = i32;

/// Contiguous, inclusive range of years covered by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    /// First year of the panel
    pub start: Period,
    /// Last year of the panel (inclusive)
    pub end: Period,
}

impl PeriodRange {
    #[must_use]
    pub const fn new(start: Period, end: Period) -> Self {
        Self { start, end }
    }

    /// Number of years in the range, zero if the bounds are inverted
    #[must_use]
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn contains(&self, period: Period) -> bool {
        period >= self.start && period <= self.end
    }

    /// Years of the range in ascending order
    #[must_use]
    pub const fn years(&self) -> std::ops::RangeInclusive<Period> {
        self.start..=self.end
    }
}

impl Default for PeriodRange {
    fn default() -> Self {
        Self::new(2016, 2024)
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
