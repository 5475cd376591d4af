// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date parsing and formatting.
//!
//! The only source of a trip's date is the free-text activity subtitle
//! (`"Nov 07 • 10:30 AM"`). The time-of-day part is discarded, a missing
//! year is filled in with the current year, and anything unparsable falls
//! back to epoch zero.

use chrono::{Datelike, LocalResult, NaiveDate, NaiveDateTime, TimeZone};

/// Separator between the date and time parts of an activity subtitle.
const SUBTITLE_SEPARATOR: char = '\u{2022}'; // •

/// Parse the date out of an activity subtitle, assuming `year` for subtitles
/// that carry none (the feed omits the year for current-year trips).
pub fn parse_subtitle_date_with_year(subtitle: &str, year: i32) -> Option<NaiveDate> {
    let date_part = subtitle
        .split(SUBTITLE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim();

    if date_part.is_empty() {
        return None;
    }

    if date_part.contains(',') {
        NaiveDate::parse_from_str(date_part, "%b %d, %Y").ok()
    } else {
        NaiveDate::parse_from_str(&format!("{}, {}", date_part, year), "%b %d, %Y").ok()
    }
}

/// Parse the date out of an activity subtitle using the current local year
/// for year-less subtitles.
pub fn parse_subtitle_date(subtitle: &str) -> Option<NaiveDate> {
    parse_subtitle_date_with_year(subtitle, chrono::Local::now().year())
}

/// Like [`parse_subtitle_date`], with unparsable dates collapsing to epoch
/// zero so they sort first. Accepted quirk carried over from the reference
/// behavior.
pub fn subtitle_date_or_epoch(subtitle: &str) -> NaiveDate {
    parse_subtitle_date(subtitle).unwrap_or(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

/// Format a date as `mm/dd/yy`.
pub fn format_mmddyy(date: NaiveDate) -> String {
    date.format("%m/%d/%y").to_string()
}

/// Format a date as an upper-case `MONTH YEAR` label.
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%B %Y").to_string().to_uppercase()
}

/// Epoch-millisecond bounds of an inclusive calendar-date range: midnight on
/// the start date through 23:59:59.999 on the end date, in `tz`.
pub fn day_bounds_ms<Tz: TimeZone>(tz: &Tz, start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    let start_dt = start.and_hms_opt(0, 0, 0).unwrap();
    let end_dt = end.and_hms_milli_opt(23, 59, 59, 999).unwrap();
    (local_ms(tz, start_dt), local_ms(tz, end_dt))
}

fn local_ms<Tz: TimeZone>(tz: &Tz, dt: NaiveDateTime) -> i64 {
    match tz.from_local_datetime(&dt) {
        LocalResult::Single(t) => t.timestamp_millis(),
        // DST fold: take the earlier instant.
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        // DST gap: the wall-clock time does not exist; treat it as UTC.
        LocalResult::None => tz.from_utc_datetime(&dt).timestamp_millis(),
    }
}
