//! `YYYYMMDDhhmmss` UTC timestamps, as used by `MDTM`/`MFMT`/`MLSD`/`MLST`.

use std::time::SystemTime;

use time::{Month, OffsetDateTime};

/// Formats `time` as `YYYYMMDDhhmmss` in UTC.
#[must_use]
pub fn format_utc(time: SystemTime) -> String {
    let dt = OffsetDateTime::from(time).to_offset(time::UtcOffset::UTC);
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

/// Renders `time` the way `ls -l` does: `Mon DD HH:MM` for the current
/// year, `Mon DD  YYYY` otherwise. Always UTC; this server has no concept
/// of a client-local timezone.
#[must_use]
pub fn format_list_date(time: SystemTime) -> String {
    let dt = OffsetDateTime::from(time).to_offset(time::UtcOffset::UTC);
    let now = OffsetDateTime::from(std::time::SystemTime::now()).to_offset(time::UtcOffset::UTC);
    let month = month_abbrev(dt.month());
    if dt.year() == now.year() {
        format!("{month} {:>2} {:02}:{:02}", dt.day(), dt.hour(), dt.minute())
    } else {
        format!("{month} {:>2}  {}", dt.day(), dt.year())
    }
}

const fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// Parses a `YYYYMMDDhhmmss` timestamp (the `MFMT` parameter) as UTC.
pub fn parse_utc(text: &str) -> Option<SystemTime> {
    if text.len() != 14 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = text[0..4].parse().ok()?;
    let month: u8 = text[4..6].parse().ok()?;
    let day: u8 = text[6..8].parse().ok()?;
    let hour: u8 = text[8..10].parse().ok()?;
    let minute: u8 = text[10..12].parse().ok()?;
    let second: u8 = text[12..14].parse().ok()?;

    let month = Month::try_from(month).ok()?;
    let date = time::Date::from_calendar_date(year, month, day).ok()?;
    let time_of_day = time::Time::from_hms(hour, minute, second).ok()?;
    let dt = date.with_time(time_of_day).assume_utc();
    Some(dt.into())
}
