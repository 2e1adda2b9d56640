//! Validated lesson durations.
//!
//! Course authors enter durations as free text. Only clock-style labels
//! (`m:ss` or `h:mm:ss`) are accepted as durations; anything else stays a
//! display string and is left out of aggregates.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

static CLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(\d+):([0-5]\d):([0-5]\d)|(\d+):([0-5]\d))\s*$").expect("valid regex")
});

/// A lesson length parsed from a clock-style label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LessonDuration(Duration);

impl LessonDuration {
    /// Parses `"m:ss"` or `"h:mm:ss"`. Returns `None` for any other label.
    pub fn parse(label: &str) -> Option<Self> {
        let caps = CLOCK_REGEX.captures(label)?;
        let field = |i: usize| -> Option<u64> { caps.get(i).and_then(|m| m.as_str().parse().ok()) };

        let seconds = if caps.get(1).is_some() {
            field(1)? * 3600 + field(2)? * 60 + field(3)?
        } else {
            field(4)? * 60 + field(5)?
        };

        Some(Self(Duration::from_secs(seconds)))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

/// Sum of the parseable lesson durations in a group of lessons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateDuration {
    pub total: Duration,
    /// Lessons whose label could not be parsed
    pub unparsed: usize,
}

impl AggregateDuration {
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut aggregate = Self::default();
        for label in labels {
            match LessonDuration::parse(label) {
                Some(d) => aggregate.total += d.as_duration(),
                None => aggregate.unparsed += 1,
            }
        }
        aggregate
    }

    pub fn is_complete(&self) -> bool {
        self.unparsed == 0
    }
}

impl fmt::Display for AggregateDuration {
    /// `"1h 5m"` when at least an hour, otherwise `"12m"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_minutes = (self.total.as_secs() + 30) / 60;
        let hours = total_minutes / 60;
        let minutes = total_minutes % 60;
        if hours > 0 {
            write!(f, "{hours}h {minutes}m")
        } else {
            write!(f, "{minutes}m")
        }
    }
}
