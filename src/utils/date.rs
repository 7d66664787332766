//! UTC datetime utilities without timezone dependencies.
//!
//! `DateTimeUtc` is a lightweight calendar timestamp used for post publish
//! dates, draft modification times and the dates shown on the blog index.
//!
//! # Formats
//!
//! - RFC 3339 (`2025-06-09T08:30:00Z`) for JSON and storage
//! - Chinese display dates (`2025年6月9日`) for post pages and the index
//!
//! # Examples
//!
//! ```ignore
//! let dt = DateTimeUtc::parse("2025-06-09T08:30:00Z").unwrap();
//! assert_eq!(dt.with_offset_hours(8).to_chinese_date(), "2025年6月9日");
//! ```

use anyhow::{Result, bail};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

const SECS_PER_DAY: i64 = 86_400;

/// UTC datetime without timezone complexity
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub const fn from_ymd(year: u16, month: u8, day: u8) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert a filesystem or clock timestamp (pre-epoch clamps to the epoch).
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::from_unix_secs(i64::try_from(secs).unwrap_or(i64::MAX))
    }

    /// Build from seconds since the Unix epoch.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_unix_secs(secs: i64) -> Self {
        let days = secs.div_euclid(SECS_PER_DAY);
        let rem = secs.rem_euclid(SECS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        Self::new(
            year.clamp(0, i64::from(u16::MAX)) as u16,
            month,
            day,
            (rem / 3600) as u8,
            (rem / 60 % 60) as u8,
            (rem % 60) as u8,
        )
    }

    /// Seconds since the Unix epoch.
    pub fn to_unix_secs(self) -> i64 {
        let days = days_from_civil(i64::from(self.year), self.month, self.day);
        days * SECS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    /// Shift by a whole number of hours (e.g. `8` for UTC+8 display).
    pub fn with_offset_hours(self, hours: i8) -> Self {
        Self::from_unix_secs(self.to_unix_secs() + i64::from(hours) * 3600)
    }

    /// Parse from "YYYY-MM-DD", "YYYY-MM-DDTHH:MM:SSZ" or with fractional seconds
    /// ("YYYY-MM-DDTHH:MM:SS.mmmZ", as browsers emit).
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();

        if bytes.len() < 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return None;
        }
        let year = parse_u16(&bytes[0..4])?;
        let month = parse_u8(&bytes[5..7])?;
        let day = parse_u8(&bytes[8..10])?;

        let (hour, minute, second) = if bytes.len() == 10 {
            (0, 0, 0)
        } else if bytes.len() >= 20
            && bytes[10] == b'T'
            && bytes[13] == b':'
            && bytes[16] == b':'
            && bytes[bytes.len() - 1] == b'Z'
        {
            let fraction = &bytes[19..bytes.len() - 1];
            if !(fraction.is_empty()
                || (fraction[0] == b'.' && fraction[1..].iter().all(u8::is_ascii_digit)))
            {
                return None;
            }
            (
                parse_u8(&bytes[11..13])?,
                parse_u8(&bytes[14..16])?,
                parse_u8(&bytes[17..19])?,
            )
        } else {
            return None;
        };

        let dt = Self::new(year, month, day, hour, minute, second);
        dt.validate().ok()?;
        Some(dt)
    }

    /// Find a Chinese display date (`2025年6月9日`) anywhere in `s`.
    pub fn parse_chinese_date(s: &str) -> Option<Self> {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日").unwrap()
        });

        let caps = RE.captures(s)?;
        let dt = Self::from_ymd(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
        dt.validate().ok()?;
        Some(dt)
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn validate(&self) -> Result<()> {
        let Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = *self;

        if !(1..=12).contains(&month) {
            bail!("month is invalid: {month}");
        }

        let max_days = Self::days_in_month(year, month);
        if day == 0 || day > max_days {
            bail!("day is invalid: {day}");
        }
        if hour > 23 {
            bail!("hour is invalid: {hour}");
        }
        if minute > 59 {
            bail!("minute is invalid: {minute}");
        }
        if second > 59 {
            bail!("second is invalid: {second}");
        }

        Ok(())
    }

    #[inline]
    #[allow(clippy::manual_is_multiple_of)]
    const fn is_leap_year(year: u16) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    #[inline]
    const fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    /// Format as RFC 3339: `YYYY-MM-DDTHH:MM:SSZ`
    pub fn to_rfc3339(self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// Format as a Chinese display date: `2025年6月9日`
    pub fn to_chinese_date(self) -> String {
        format!("{}年{}月{}日", self.year, self.month, self.day)
    }
}

impl Serialize for DateTimeUtc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for DateTimeUtc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid datetime `{s}`")))
    }
}

/// Days since 1970-01-01 to (year, month, day), proleptic Gregorian.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// (year, month, day) to days since 1970-01-01.
fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let mp = (i64::from(month) + 9) % 12;
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Parse 4-digit ASCII number
#[inline]
fn parse_u16(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0')),
    )
}

/// Parse 2-digit ASCII number
#[inline]
fn parse_u8(bytes: &[u8]) -> Option<u8> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = bytes[0].wrapping_sub(b'0');
    let d2 = bytes[1].wrapping_sub(b'0');
    if d1 > 9 || d2 > 9 {
        return None;
    }
    Some(d1 * 10 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_only() {
        let dt = DateTimeUtc::parse("2024-06-15").unwrap();
        assert_eq!(dt, DateTimeUtc::from_ymd(2024, 6, 15));
    }

    #[test]
    fn test_parse_with_time_and_fraction() {
        let dt = DateTimeUtc::parse("2025-06-09T08:30:05Z").unwrap();
        assert_eq!(dt, DateTimeUtc::new(2025, 6, 9, 8, 30, 5));

        let dt = DateTimeUtc::parse("2025-06-09T08:30:05.123Z").unwrap();
        assert_eq!(dt, DateTimeUtc::new(2025, 6, 9, 8, 30, 5));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DateTimeUtc::parse("2025-13-01").is_none());
        assert!(DateTimeUtc::parse("2025-02-30").is_none());
        assert!(DateTimeUtc::parse("2025/06/09").is_none());
        assert!(DateTimeUtc::parse("2025-06-09T08:30:05+08:00").is_none());
        assert!(DateTimeUtc::parse("").is_none());
    }

    #[test]
    fn test_validate_leap_year() {
        assert!(DateTimeUtc::from_ymd(2024, 2, 29).validate().is_ok());
        assert!(DateTimeUtc::from_ymd(2023, 2, 29).validate().is_err());
        assert!(DateTimeUtc::from_ymd(1900, 2, 29).validate().is_err());
        assert!(DateTimeUtc::from_ymd(2000, 2, 29).validate().is_ok());
    }

    #[test]
    fn test_unix_round_trip() {
        assert_eq!(
            DateTimeUtc::from_unix_secs(0),
            DateTimeUtc::from_ymd(1970, 1, 1)
        );
        let dt = DateTimeUtc::new(2025, 6, 9, 23, 59, 59);
        assert_eq!(DateTimeUtc::from_unix_secs(dt.to_unix_secs()), dt);
        assert_eq!(
            DateTimeUtc::from_unix_secs(1_709_251_199),
            DateTimeUtc::new(2024, 2, 29, 23, 59, 59)
        );
    }

    #[test]
    fn test_offset_crosses_midnight() {
        let dt = DateTimeUtc::new(2025, 6, 9, 20, 0, 0).with_offset_hours(8);
        assert_eq!(dt, DateTimeUtc::new(2025, 6, 10, 4, 0, 0));
    }

    #[test]
    fn test_chinese_date() {
        let dt = DateTimeUtc::from_ymd(2025, 6, 9);
        assert_eq!(dt.to_chinese_date(), "2025年6月9日");
        assert_eq!(
            DateTimeUtc::parse_chinese_date("发布于 2025年6月9日 · 技术"),
            Some(dt)
        );
        assert_eq!(DateTimeUtc::parse_chinese_date("2025年2月30日"), None);
        assert_eq!(DateTimeUtc::parse_chinese_date("no date"), None);
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = DateTimeUtc::new(2024, 12, 31, 23, 0, 0);
        let b = DateTimeUtc::new(2025, 1, 1, 0, 0, 0);
        assert!(a < b);
    }

    #[test]
    fn test_serde_as_rfc3339() {
        let dt = DateTimeUtc::new(2025, 6, 9, 8, 30, 0);
        let json = serde_json::to_string(&dt).unwrap();
        assert_eq!(json, "\"2025-06-09T08:30:00Z\"");
        let back: DateTimeUtc = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dt);
    }
}
