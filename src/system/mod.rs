//! System utilities for embedded devices.
//!
//! This module provides the small pieces of platform glue the web server needs
//! from its host: a millisecond clock, plus an uptime formatter that status
//! pages commonly show.
//!
//! # Usage
//!
//! ```rust
//! use microweb::system::{Clock, Uptime};
//!
//! struct FixedClock(u64);
//!
//! impl Clock for FixedClock {
//!     fn now_ms(&self) -> u64 {
//!         self.0
//!     }
//! }
//!
//! let clock = FixedClock(90_061_000);
//! let uptime = Uptime::from_millis(clock.now_ms());
//! assert_eq!(uptime.as_str(), "1:1:1:1");
//! ```

use core::fmt::Write;
use heapless::String;

/// Maximum length of a formatted uptime (`DAYS:HH:MM:SS`).
pub const UPTIME_MAX_LEN: usize = 24;

/// A monotonic millisecond clock.
///
/// On a microcontroller this is usually backed by a SysTick counter or an RTC.
/// The value only needs to be monotonic; its origin is irrelevant.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `since`, which must be an earlier reading.
    fn elapsed_ms(&self, since: u64) -> u64 {
        self.now_ms().saturating_sub(since)
    }
}

/// Uptime broken down into days, hours, minutes and seconds.
///
/// Formats as `D:H:M:S` without zero padding, e.g. `1:20:23:50` for one day,
/// twenty hours, twenty-three minutes and fifty seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uptime {
    /// Whole days.
    pub days: u64,
    /// Hours within the day (0-23).
    pub hours: u8,
    /// Minutes within the hour (0-59).
    pub minutes: u8,
    /// Seconds within the minute (0-59).
    pub seconds: u8,
    text: String<UPTIME_MAX_LEN>,
}

impl Uptime {
    /// Break a millisecond reading down into its components.
    pub fn from_millis(millis: u64) -> Self {
        let secs = millis / 1000;
        let mins = secs / 60;
        let hours = mins / 60;
        let days = hours / 24;

        let mut uptime = Self {
            days,
            hours: (hours % 24) as u8,
            minutes: (mins % 60) as u8,
            seconds: (secs % 60) as u8,
            text: String::new(),
        };
        // u64::MAX days plus the fixed fields still fits UPTIME_MAX_LEN
        let _ = write!(
            uptime.text,
            "{}:{}:{}:{}",
            uptime.days, uptime.hours, uptime.minutes, uptime.seconds
        );
        uptime
    }

    /// The formatted `D:H:M:S` string.
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

impl core::fmt::Display for Uptime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
