//! # Time Basis
//!
//! The face shows local wall-clock time. The host announces timezone changes with
//! an identifier string; this module turns that identifier into a fixed UTC
//! offset and formats the time and date lines from it.
//!
//! Only offset-style identifiers are understood (`UTC`, `+05:30`, `GMT-3`, ...).
//! Region names such as `Europe/Paris` fall back to the system zone, which the
//! host has already switched when it sends the broadcast.

use crate::format::format_time;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Offset, Timelike, Utc};
use log::{info, warn};
use std::fmt::Write;

/// Default day/date pattern, e.g. `FRI, JUL 4 2025` after upper-casing.
pub const DEFAULT_DATE_FORMAT: &str = "%a, %b %-d %Y";

/// Parse a timezone identifier into a fixed offset.
///
/// Accepts `UTC`, `GMT`, `Z`, and offsets written `±HH:MM`, `±HHMM` or `±HH`,
/// optionally prefixed by `UTC` or `GMT`.
pub fn parse_timezone(id: &str) -> Option<FixedOffset> {
    let id = id.trim();
    let rest = id
        .strip_prefix("UTC")
        .or_else(|| id.strip_prefix("GMT"))
        .unwrap_or(id);

    if rest.is_empty() || rest == "Z" {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    if !digits.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };

    if hours.is_empty() || hours.len() > 2 || minutes.is_empty() || minutes.len() > 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Whether chrono understands every specifier in a date pattern.
pub fn is_valid_date_format(pattern: &str) -> bool {
    StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error))
}

/// Offset of the system timezone right now.
pub fn system_offset() -> FixedOffset {
    Local::now().offset().fix()
}

/// The zone the face renders time in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeBasis {
    offset: FixedOffset,
}

impl Default for TimeBasis {
    fn default() -> Self {
        Self::system()
    }
}

impl TimeBasis {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Time basis following the system timezone.
    pub fn system() -> Self {
        Self::new(system_offset())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Switch to the zone named by a timezone-changed broadcast.
    pub fn apply_timezone(&mut self, id: &str) {
        self.offset = match parse_timezone(id) {
            Some(offset) => offset,
            None => {
                warn!("unrecognized timezone '{}', using system zone", id);
                system_offset()
            }
        };
        info!("time basis now {}", self.offset);
    }

    /// Convert an instant to local wall-clock time.
    pub fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    /// Digital time line for `now`.
    pub fn time_text(&self, now: DateTime<Utc>, ambient: bool) -> String {
        let local = self.local(now);
        format_time(local.hour(), local.minute(), local.second(), ambient)
    }

    /// Upper-cased day and date line for `now`.
    ///
    /// A pattern chrono cannot format falls back to [`DEFAULT_DATE_FORMAT`].
    pub fn date_text(&self, now: DateTime<Utc>, pattern: &str) -> String {
        let local = self.local(now);
        let mut text = String::new();
        if write!(text, "{}", local.format(pattern)).is_err() {
            warn!("date pattern '{}' is invalid, using default", pattern);
            text = local.format(DEFAULT_DATE_FORMAT).to_string();
        }
        text.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn offset(seconds: i32) -> Option<FixedOffset> {
        FixedOffset::east_opt(seconds)
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("UTC"), offset(0));
        assert_eq!(parse_timezone("GMT"), offset(0));
        assert_eq!(parse_timezone("Z"), offset(0));
        assert_eq!(parse_timezone("+05:30"), offset(19_800));
        assert_eq!(parse_timezone("-0330"), offset(-12_600));
        assert_eq!(parse_timezone("GMT-3"), offset(-10_800));
        assert_eq!(parse_timezone("UTC+14"), offset(50_400));
        assert_eq!(parse_timezone(" +02:00 "), offset(7_200));
    }

    #[test]
    fn test_parse_timezone_rejects_garbage() {
        assert_eq!(parse_timezone("Europe/Paris"), None);
        assert_eq!(parse_timezone("+"), None);
        assert_eq!(parse_timezone("+15"), None);
        assert_eq!(parse_timezone("+05:75"), None);
        assert_eq!(parse_timezone("+123:00"), None);
        assert_eq!(parse_timezone("UTC+ab"), None);
        assert_eq!(parse_timezone("+1é1"), None);
        assert_eq!(parse_timezone("-é"), None);
        assert_eq!(parse_timezone("+0:3é"), None);
    }

    #[test]
    fn test_region_name_falls_back_to_system_zone() {
        let mut basis = TimeBasis::new(FixedOffset::east_opt(3_600).unwrap());
        basis.apply_timezone("Europe/Paris");
        assert_eq!(basis.offset(), system_offset());
    }

    #[test]
    fn test_invalid_date_pattern_falls_back() {
        assert!(is_valid_date_format(DEFAULT_DATE_FORMAT));
        assert!(!is_valid_date_format("%a %Q"));

        let now = Utc.with_ymd_and_hms(2025, 7, 4, 22, 5, 9).unwrap();
        let basis = TimeBasis::new(FixedOffset::east_opt(0).unwrap());
        assert_eq!(basis.date_text(now, "%a %Q"), "FRI, JUL 4 2025");
    }

    #[test]
    fn test_time_and_date_text() {
        let now = Utc.with_ymd_and_hms(2025, 7, 4, 22, 5, 9).unwrap();
        let mut basis = TimeBasis::new(FixedOffset::east_opt(0).unwrap());

        assert_eq!(basis.time_text(now, false), "22:05:09");
        assert_eq!(basis.time_text(now, true), "22:05");
        assert_eq!(basis.date_text(now, DEFAULT_DATE_FORMAT), "FRI, JUL 4 2025");

        basis.apply_timezone("+03:00");
        assert_eq!(basis.time_text(now, false), "1:05:09");
        assert_eq!(basis.date_text(now, DEFAULT_DATE_FORMAT), "SAT, JUL 5 2025");
    }
}
