//! VTIMEZONE rendering from the tz database bundled with `chrono-tz`

use chrono::{DateTime, Datelike, Duration, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

use icalendar::{Calendar, Property};

/// A UTC-offset change of a zone
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Instant the new offset takes effect
    pub at: DateTime<Utc>,
    /// Offset in seconds before the change
    pub offset_from: i32,
    /// Offset in seconds after the change
    pub offset_to: i32,
    /// Abbreviation in effect after the change (e.g. `EEST`)
    pub abbreviation: String,
    /// Whether the new offset is daylight saving time
    pub is_dst: bool,
}

impl Transition {
    /// Wall-clock time of the change, expressed in the old offset
    #[must_use]
    pub fn local_onset(&self) -> chrono::NaiveDateTime {
        self.at.naive_utc() + Duration::seconds(i64::from(self.offset_from))
    }
}

fn offset_seconds(tz: Tz, at: DateTime<Utc>) -> i32 {
    tz.offset_from_utc_datetime(&at.naive_utc())
        .fix()
        .local_minus_utc()
}

/// All offset changes of `tz` in `[from, until)`.
///
/// Scans hourly and narrows each hit to the minute, which covers zones
/// whose transitions fall on half or quarter hours.
#[must_use]
pub fn transitions(tz: Tz, from: DateTime<Utc>, until: DateTime<Utc>) -> Vec<Transition> {
    let mut found = Vec::new();
    let mut cursor = from;
    let mut current = offset_seconds(tz, cursor);

    while cursor < until {
        let next = cursor + Duration::hours(1);
        let next_offset = offset_seconds(tz, next);
        if next_offset != current {
            let mut at = cursor;
            while offset_seconds(tz, at) == current && at < next {
                at += Duration::minutes(1);
            }
            let local = tz.from_utc_datetime(&at.naive_utc());
            found.push(Transition {
                at,
                offset_from: current,
                offset_to: next_offset,
                abbreviation: local.format("%Z").to_string(),
                is_dst: local.offset().dst_offset() != Duration::zero(),
            });
            current = next_offset;
        }
        cursor = next;
    }

    found
}

/// Format a UTC offset as `+HHMM` (or `+HHMMSS` for second offsets)
#[must_use]
pub fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    let (hours, minutes, secs) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    if secs == 0 {
        format!("{sign}{hours:02}{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}{secs:02}")
    }
}

fn start_of_year(year: i32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

fn push_line(calendar: &mut Calendar, name: &str, value: String) {
    calendar.append_property(Property::new(name, value));
}

/// Append a VTIMEZONE block covering `first..=last`.
///
/// The builder has no VTIMEZONE component, so the block is emitted as
/// calendar-level lines; they render after the header and ahead of every
/// event.
///
/// Observances start on January 1st of the year before `first` so the
/// earliest event is always preceded by an onset, and run to the end of
/// `last`'s year. Zones without any change get a single STANDARD block.
pub fn append_vtimezone(calendar: &mut Calendar, tz: Tz, first: NaiveDate, last: NaiveDate) {
    let from = start_of_year(first.year() - 1);
    let until = start_of_year(last.year() + 1);
    let changes = transitions(tz, from, until);

    push_line(calendar, "BEGIN", "VTIMEZONE".to_string());
    push_line(calendar, "TZID", tz.name().to_string());
    push_line(calendar, "X-LIC-LOCATION", tz.name().to_string());

    if changes.is_empty() {
        let local = tz.from_utc_datetime(&from.naive_utc());
        let offset = format_offset(local.offset().fix().local_minus_utc());
        push_line(calendar, "BEGIN", "STANDARD".to_string());
        push_line(calendar, "TZOFFSETFROM", offset.clone());
        push_line(calendar, "TZOFFSETTO", offset);
        push_line(calendar, "TZNAME", local.format("%Z").to_string());
        push_line(calendar, "DTSTART", "19700101T000000".to_string());
        push_line(calendar, "END", "STANDARD".to_string());
    }

    for change in &changes {
        let kind = if change.is_dst { "DAYLIGHT" } else { "STANDARD" };
        push_line(calendar, "BEGIN", kind.to_string());
        push_line(calendar, "TZOFFSETFROM", format_offset(change.offset_from));
        push_line(calendar, "TZOFFSETTO", format_offset(change.offset_to));
        push_line(calendar, "TZNAME", change.abbreviation.clone());
        push_line(
            calendar,
            "DTSTART",
            change.local_onset().format("%Y%m%dT%H%M%S").to_string(),
        );
        push_line(calendar, "END", kind.to_string());
    }

    push_line(calendar, "END", "VTIMEZONE".to_string());
}
