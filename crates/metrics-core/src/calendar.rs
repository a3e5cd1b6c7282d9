use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Milliseconds in one day, the divisor for [`day_span`].
const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse a dataset timestamp into a UTC [`DateTime`].
///
/// Accepts RFC 3339 (with `Z` or an offset), naive date-times with `T` or a
/// space separator, and bare `YYYY-MM-DD` dates (midnight). Naive values are
/// taken to be UTC. Returns `None` for empty or unrecognised input.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const FMTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in FMTS {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

// ── ISO-8601 weeks ────────────────────────────────────────────────────────────

/// An ISO-8601 week: the week-numbering year and the week within it (1-53).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u32,
}

impl IsoWeek {
    /// Category label in `YYYY-Www` form, e.g. `"2020-W53"`.
    ///
    /// The week is zero-padded so lexicographic order is chronological.
    pub fn label(&self) -> String {
        format!("{:04}-W{:02}", self.year, self.week)
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Compute the ISO-8601 week of `date`.
///
/// The date is shifted to the Thursday of its Monday-based week; that
/// Thursday's calendar year is the week-numbering year and its day-of-year
/// determines the week: `ceil(ordinal / 7)`.
pub fn iso_week(date: NaiveDate) -> IsoWeek {
    let weekday = i64::from(date.weekday().number_from_monday());
    let thursday = date + Duration::days(4 - weekday);
    let ordinal = thursday.ordinal();
    IsoWeek {
        year: thursday.year(),
        week: ordinal.div_ceil(7),
    }
}

// ── Elapsed time ──────────────────────────────────────────────────────────────

/// Elapsed time from `start` to `end` in fractional days.
///
/// Pure elapsed-time division; negative when `end` precedes `start`.
pub fn day_span(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_DAY
}

// ── ReportingZone ─────────────────────────────────────────────────────────────

/// Timezone in which calendar buckets (ISO weeks) are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingZone {
    tz: Tz,
}

impl Default for ReportingZone {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl ReportingZone {
    /// Resolve a zone name.
    ///
    /// `"auto"` uses the system timezone. Unrecognised names fall back to UTC
    /// with a warning.
    pub fn resolve(name: &str) -> Self {
        let name = if name.eq_ignore_ascii_case("auto") {
            system_timezone()
        } else {
            name.to_string()
        };
        let tz = name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "ReportingZone: unrecognised timezone \"{}\", falling back to UTC",
                name
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// Validate that `name` is `"auto"` or a recognised IANA identifier.
    pub fn is_valid(name: &str) -> bool {
        name.eq_ignore_ascii_case("auto") || name.parse::<Tz>().is_ok()
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Calendar date of `instant` as seen in this zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// ISO week of `instant` as seen in this zone.
    pub fn iso_week(&self, instant: DateTime<Utc>) -> IsoWeek {
        iso_week(self.local_date(instant))
    }
}

/// IANA name of the running system's timezone, `"UTC"` when undetectable.
pub fn system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
