// src/utils/time.rs

//! Publish-time parsing for listing rows.
//!
//! The portal prints times in several shapes depending on the age of the
//! announcement: `今天 14:00`, `昨天 09:30`, `2024-11-02 14:00`, `2024-11-02`,
//! `2024/11/02`, or a bare `11-02` for old pinned items. All of them are
//! interpreted in the portal's local time zone.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use regex::Regex;

const TODAY_MARKERS: &[&str] = &["今天", "today"];
const YESTERDAY_MARKERS: &[&str] = &["昨天", "yesterday"];

/// Month-day dates further ahead than this are taken to belong to last year.
const ROLLOVER_WINDOW_DAYS: i64 = 30;

static TRAILING_CLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\d:])(\d{1,2}:\d{2}(?::\d{2})?)\s*$").ok());

/// Outcome of parsing a raw time string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTime {
    /// A local wall-clock time on the portal.
    At(NaiveDateTime),
    /// Nothing usable was found. Callers drop the row.
    Unparseable,
}

impl ParsedTime {
    /// The parsed time, if any.
    pub fn datetime(self) -> Option<NaiveDateTime> {
        match self {
            ParsedTime::At(t) => Some(t),
            ParsedTime::Unparseable => None,
        }
    }

    /// The parsed time, or the epoch start for unparseable input.
    pub fn or_epoch(self) -> NaiveDateTime {
        self.datetime()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH.naive_utc())
    }
}

/// Parse a listing time string relative to `now` (portal local time).
///
/// Total and pure: every input maps to exactly one [`ParsedTime`].
pub fn parse_time(raw: &str, now: NaiveDateTime) -> ParsedTime {
    let text = normalize_whitespace(raw);
    match resolve(&text, now) {
        Some(t) => ParsedTime::At(t),
        None => ParsedTime::Unparseable,
    }
}

/// Collapse the portal's whitespace variants into single ASCII spaces.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace('\u{200e}', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let lower = text.to_lowercase();
    if TODAY_MARKERS.iter().any(|m| lower.contains(m)) {
        return at_trailing_clock(now.date(), text);
    }
    if YESTERDAY_MARKERS.iter().any(|m| lower.contains(m)) {
        return at_trailing_clock(now.date().pred_opt()?, text);
    }

    let tokens: Vec<&str> = text.split(' ').collect();
    if tokens.len() >= 2 && tokens.last().is_some_and(|t| t.contains(':')) {
        return NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
            .ok();
    }

    let date_part = tokens.first().copied().unwrap_or_default();
    if date_part.split('-').count() == 3 {
        return at_noon(NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?);
    }
    if date_part.split('/').count() == 3 {
        return at_noon(NaiveDate::parse_from_str(date_part, "%Y/%m/%d").ok()?);
    }

    let dashed = date_part.replace('/', "-");
    if dashed.split('-').count() == 2 {
        let date = NaiveDate::parse_from_str(&format!("{}-{dashed}", now.year()), "%Y-%m-%d").ok()?;
        let parsed = at_noon(date)?;
        if parsed > now + Duration::days(ROLLOVER_WINDOW_DAYS) {
            return parsed.with_year(now.year() - 1);
        }
        return Some(parsed);
    }

    None
}

fn at_trailing_clock(date: NaiveDate, text: &str) -> Option<NaiveDateTime> {
    let clock = TRAILING_CLOCK.as_ref()?.captures(text)?.get(1)?.as_str();
    let time = NaiveTime::parse_from_str(clock, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M"))
        .ok()?;
    Some(date.and_time(time))
}

fn at_noon(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(12, 0, 0)
}

/// Build the fixed offset of the portal's time zone.
pub fn portal_offset(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

/// Current wall-clock time in the portal's time zone.
pub fn portal_now(offset: FixedOffset) -> NaiveDateTime {
    Utc::now().with_timezone(&offset).naive_local()
}

/// Interpret a portal-local time as an absolute instant.
pub fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
