//! Wall clock: record timestamps and the monthly scan directory.
//!
//! RULE: Nothing in the engine calls `Local::now()` directly.
//! Time flows through an injected Clock so passes are reproducible in tests.

use chrono::{DateTime, FixedOffset, Offset, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Month directory name for the current time, e.g. `2104` for April 2021.
    fn month_dir(&self) -> String {
        self.now().format("%y%m").to_string()
    }
}

/// Real time, rendered in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Falls back to UTC when the offset is out of range.
    pub fn with_offset_hours(hours: i32) -> Self {
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// A clock frozen at one instant. Used in tests and replay tooling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock {
    pub at: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self { at }
    }

    /// Parse an RFC 3339 timestamp, e.g. `2021-04-05T09:00:00+08:00`.
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            at: DateTime::parse_from_rfc3339(rfc3339)?,
        })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.at
    }
}
