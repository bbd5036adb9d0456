//! Flexible timestamp parsing and canonical UTC rendering
//!
//! Values are first matched against the strict form
//! `YYYY-MM-DD[( |T)HH:MM[:SS[.fff]]][Z|±HH:MM]`. Anything else falls back to
//! a list of common export formats. Timestamps without a zone are read as
//! wall-clock time in the local timezone of the machine doing the hashing,
//! so hashes of such values are only stable across machines sharing a zone.

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
    Utc,
};

use super::text::normalize_text;

/// Formats carrying their own offset, tried after RFC 3339 / RFC 2822.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%a %b %d %Y %H:%M:%S GMT%z",
];

/// Formats without a zone, interpreted in local time.
const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y, %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %I:%M %p",
    "%b %d %Y %H:%M:%S",
    "%a %b %d %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Date-only formats, interpreted as local midnight.
const LOCAL_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%a %b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Normalize a last-modified value to canonical UTC ISO-8601.
///
/// Empty or unparseable input yields an empty string.
pub fn normalize_date(raw: &str) -> String {
    let text = normalize_text(raw);
    if text.is_empty() {
        return String::new();
    }

    parse_flexible(&text)
        .map(|dt| render_utc(&dt))
        .unwrap_or_default()
}

/// Parse a normalized date string into UTC, strict form first.
pub fn parse_flexible(text: &str) -> Option<DateTime<Utc>> {
    parse_strict(text).or_else(|| parse_fallback(text))
}

/// Render with second precision and a `Z` suffix. Milliseconds are kept only
/// when nonzero.
pub fn render_utc(dt: &DateTime<Utc>) -> String {
    let base = dt.format("%Y-%m-%dT%H:%M:%S");
    match dt.timestamp_subsec_millis() {
        0 => format!("{base}Z"),
        ms => format!("{base}.{ms:03}Z"),
    }
}

// ============================================================================
// Strict form
// ============================================================================

/// Zone designator of the strict form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Utc,
    Offset(i32),
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, options: &[u8]) -> Option<u8> {
        let b = self.peek().filter(|b| options.contains(b))?;
        self.pos += 1;
        Some(b)
    }

    /// Read exactly `n` ASCII digits.
    fn digits(&mut self, n: usize) -> Option<u32> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        let mut value = 0u32;
        for &b in slice {
            if !b.is_ascii_digit() {
                return None;
            }
            value = value * 10 + u32::from(b - b'0');
        }
        self.pos = end;
        Some(value)
    }

    /// Read between one and `max` digits of a fraction, scaled to milliseconds.
    fn millis(&mut self, max: usize) -> Option<u32> {
        let start = self.pos;
        while self.pos - start < max && self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let width = self.pos - start;
        if width == 0 {
            return None;
        }
        let mut value = 0u32;
        for &b in &self.bytes[start..self.pos] {
            value = value * 10 + u32::from(b - b'0');
        }
        Some(value * 10u32.pow((3 - width) as u32))
    }

    fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

fn parse_strict(text: &str) -> Option<DateTime<Utc>> {
    let mut c = Cursor::new(text);

    let year = c.digits(4)?;
    c.eat(b'-').then_some(())?;
    let month = c.digits(2)?;
    c.eat(b'-').then_some(())?;
    let day = c.digits(2)?;
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;

    let mut time = NaiveTime::MIN;
    if c.eat_any(b" T").is_some() {
        let hour = c.digits(2)?;
        c.eat(b':').then_some(())?;
        let minute = c.digits(2)?;
        let (mut second, mut milli) = (0, 0);
        if c.eat(b':') {
            second = c.digits(2)?;
            if c.eat(b'.') {
                milli = c.millis(3)?;
            }
        }
        time = NaiveTime::from_hms_milli_opt(hour, minute, second, milli)?;
    }

    let zone = match c.peek() {
        None => None,
        Some(b'Z') => {
            c.pos += 1;
            Some(Zone::Utc)
        }
        Some(_) => {
            let sign = match c.eat_any(b"+-")? {
                b'-' => -1,
                _ => 1,
            };
            let hours = c.digits(2)?;
            c.eat(b':').then_some(())?;
            let minutes = c.digits(2)?;
            Some(Zone::Offset(sign * (hours * 3600 + minutes * 60) as i32))
        }
    };
    if !c.at_end() {
        return None;
    }

    let naive = NaiveDateTime::new(date, time);
    match zone {
        Some(Zone::Utc) => Some(naive.and_utc()),
        Some(Zone::Offset(secs)) => from_offset(naive, secs),
        None => from_local(naive),
    }
}

fn from_offset(naive: NaiveDateTime, offset_secs: i32) -> Option<DateTime<Utc>> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Interpret wall-clock time in the local zone.
///
/// Ambiguous times (clocks falling back) take the earlier instant. Times in a
/// spring-forward gap are pushed forward by one hour.
fn from_local(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    let resolved = match chrono::Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => chrono::Local
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest(),
    };
    resolved.map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Fallback formats
// ============================================================================

fn parse_fallback(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return from_local(truncate_to_millis(naive));
        }
    }
    for fmt in LOCAL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return from_local(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

fn truncate_to_millis(naive: NaiveDateTime) -> NaiveDateTime {
    let nanos = naive.and_utc().timestamp_subsec_nanos();
    naive - TimeDelta::nanoseconds(i64::from(nanos % 1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn local_utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> String {
        let naive = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        render_utc(&from_local(naive).unwrap())
    }

    #[test]
    fn zulu_timestamp() {
        assert_eq!(normalize_date("2024-03-05T10:20:30Z"), "2024-03-05T10:20:30Z");
    }

    #[test]
    fn offset_converts_to_utc() {
        assert_eq!(
            normalize_date("2024-03-05 10:20:30+02:00"),
            "2024-03-05T08:20:30Z"
        );
        assert_eq!(
            normalize_date("2024-03-05T23:30-01:30"),
            "2024-03-06T01:00:00Z"
        );
    }

    #[test]
    fn zero_millis_stripped_nonzero_kept() {
        assert_eq!(normalize_date("2024-03-05T10:20:30.000Z"), "2024-03-05T10:20:30Z");
        assert_eq!(normalize_date("2024-03-05T10:20:30.120Z"), "2024-03-05T10:20:30.120Z");
        assert_eq!(normalize_date("2024-03-05T10:20:30.5Z"), "2024-03-05T10:20:30.500Z");
    }

    #[test]
    fn unzoned_is_local_time() {
        assert_eq!(normalize_date("2024-03-05 10:20:30"), local_utc(2024, 3, 5, 10, 20, 30));
        assert_eq!(normalize_date("2024-03-05"), local_utc(2024, 3, 5, 0, 0, 0));
        assert_eq!(normalize_date("2024-03-05T10:20"), local_utc(2024, 3, 5, 10, 20, 0));
    }

    #[test]
    fn surrounding_whitespace_ignored() {
        assert_eq!(normalize_date("  2024-03-05T10:20:30Z \n"), "2024-03-05T10:20:30Z");
    }

    #[test]
    fn fallback_formats() {
        assert_eq!(
            normalize_date("Tue, 05 Mar 2024 10:20:30 +0000"),
            "2024-03-05T10:20:30Z"
        );
        assert_eq!(normalize_date("03/05/2024 10:20:30"), local_utc(2024, 3, 5, 10, 20, 30));
        assert_eq!(normalize_date("March 5, 2024"), local_utc(2024, 3, 5, 0, 0, 0));
        assert_eq!(
            normalize_date("2024-03-05T10:20:30.123456Z"),
            "2024-03-05T10:20:30.123Z"
        );
    }

    #[test]
    fn invalid_calendar_values_rejected() {
        assert_eq!(normalize_date("2024-13-01"), "");
        assert_eq!(normalize_date("2024-02-30T10:00Z"), "");
        assert_eq!(normalize_date("2024-03-05T25:00Z"), "");
    }

    #[test]
    fn garbage_is_empty() {
        assert_eq!(normalize_date("not a date"), "");
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "");
    }

    #[test]
    fn strict_rejects_trailing_text() {
        assert!(parse_strict("2024-03-05T10:20Zjunk").is_none());
        assert!(parse_strict("2024-3-5").is_none());
    }

    #[test]
    fn normalized_output_is_stable() {
        let once = normalize_date("2024-03-05T10:20:30.250+05:30");
        assert_eq!(once, "2024-03-05T04:50:30.250Z");
        assert_eq!(normalize_date(&once), once);
    }
}
