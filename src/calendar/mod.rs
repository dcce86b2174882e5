//! Forecast to iCalendar rendering
//!
//! [`generate`] is a pure function of the location, the forecast days and
//! the generation timestamp. The timestamp only ever lands in `DTSTAMP` and
//! `LAST-MODIFIED`, see [`crate::change`].

use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::parser::{self, read_calendar, unfold};
use icalendar::{Calendar, Component as _, Property, ValueType};
use tracing::{debug, instrument};

use crate::error::ForecastError;
use crate::models::forecast::format_number;
use crate::models::{DailyForecast, LocationConfig};
use crate::Result;

pub mod timezone;

pub const PRODUCT_ID: &str = "-//Weather Forecast Calendar//forecast-ics//EN";
/// Domain part of every event UID
pub const UID_DOMAIN: &str = "forecast-ics";
/// Length of timed events
pub const TIMED_EVENT_MINUTES: i64 = 15;
/// Suggested polling interval for subscribed clients
pub const REFRESH_INTERVAL: &str = "PT12H";

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Start or end of an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    /// Date-only value (all-day events)
    Date(NaiveDate),
    /// Wall-clock time tagged with a TZID
    Local { datetime: NaiveDateTime, tz: Tz },
}

impl EventTime {
    fn to_property(&self, name: &str) -> Property {
        match self {
            EventTime::Date(date) => {
                let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
                prop.append_parameter(ValueType::Date);
                prop
            }
            EventTime::Local { datetime, tz } => {
                let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
                prop.add_parameter("TZID", tz.name());
                prop
            }
        }
    }
}

impl Display for EventTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventTime::Date(date) => write!(f, "{date}"),
            EventTime::Local { datetime, tz } => write!(f, "{datetime} {}", tz.name()),
        }
    }
}

/// One rendered forecast day
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub start: EventTime,
    pub end: EventTime,
    pub summary: String,
    pub description: String,
    pub url: Option<String>,
    pub geo: (f64, f64),
}

impl CalendarEvent {
    /// Build the event for one forecast day
    pub fn from_forecast(location: &LocationConfig, day: &DailyForecast) -> Result<Self> {
        for (field, value) in day.numeric_fields() {
            if !value.is_finite() {
                return Err(ForecastError::format(format!(
                    "{field} for {} is not a finite number",
                    day.date
                )));
            }
        }
        if day.precipitation_probability > 100 {
            return Err(ForecastError::format(format!(
                "precipitation probability {} for {} is outside 0-100",
                day.precipitation_probability, day.date
            )));
        }

        let (start, end) = event_span(location, day.date)?;

        let summary = format!(
            "{} {} {} / {}",
            day.emoji(&location.units),
            location.name,
            day.format_high(location.units.temperature),
            day.format_low(location.units.temperature)
        );

        let mut lines = day.description_lines(&location.units);
        let url = (!location.link_url.trim().is_empty()).then(|| location.link_url.trim().to_string());
        if let Some(url) = &url {
            lines.push(String::new());
            lines.push(format!("Forecast details: {url}"));
        }

        Ok(Self {
            uid: event_uid(location, day.date),
            start,
            end,
            summary,
            description: lines.join("\n"),
            url,
            geo: location.rounded_coordinates(4),
        })
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self.start, EventTime::Date(_))
    }

    /// Build the VEVENT; `stamp` lands in DTSTAMP and LAST-MODIFIED only
    fn to_ical(&self, stamp: &str) -> icalendar::Event {
        let mut event = icalendar::Event::new();
        event.uid(&self.uid);
        event.add_property("DTSTAMP", stamp);
        event.add_property("LAST-MODIFIED", stamp);
        event.append_property(self.start.to_property("DTSTART"));
        event.append_property(self.end.to_property("DTEND"));
        event.summary(&self.summary);
        event.description(&self.description);
        if let Some(url) = &self.url {
            event.add_property("URL", url);
        }
        event.add_property(
            "GEO",
            format!("{};{}", format_number(self.geo.0), format_number(self.geo.1)),
        );
        event.add_property("STATUS", "CONFIRMED");
        event.add_property("TRANSP", "TRANSPARENT");
        event.done()
    }
}

impl Display for CalendarEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.summary)?;

        if self.is_all_day() {
            writeln!(f, "   📅 All-day event on {}", self.start)?;
        } else {
            writeln!(f, "   ⏰ {} - {}", self.start, self.end)?;
        }

        for line in self.description.lines().filter(|l| !l.is_empty()) {
            writeln!(f, "   {line}")?;
        }
        Ok(())
    }
}

/// Deterministic identifier for a location and date
#[must_use]
pub fn event_uid(location: &LocationConfig, date: NaiveDate) -> String {
    format!(
        "weather-{}-{}@{UID_DOMAIN}",
        date.format("%Y%m%d"),
        location.uid_key()
    )
}

fn event_span(location: &LocationConfig, date: NaiveDate) -> Result<(EventTime, EventTime)> {
    match location.event_time {
        None => {
            let next = date.succ_opt().ok_or_else(|| {
                ForecastError::format(format!("no calendar day follows {date}"))
            })?;
            Ok((EventTime::Date(date), EventTime::Date(next)))
        }
        Some(time) => {
            let start = date.and_time(time);
            let end = start
                .checked_add_signed(Duration::minutes(TIMED_EVENT_MINUTES))
                .ok_or_else(|| {
                    ForecastError::format(format!("event end after {start} is out of range"))
                })?;
            let tz = location.timezone;
            Ok((
                EventTime::Local { datetime: start, tz },
                EventTime::Local { datetime: end, tz },
            ))
        }
    }
}

/// Reject empty or out-of-order forecast sequences
pub fn validate_days(days: &[DailyForecast]) -> Result<()> {
    if days.is_empty() {
        return Err(ForecastError::validation(
            "forecast contains no days, nothing to render",
        ));
    }
    for pair in days.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(ForecastError::validation(format!(
                "forecast dates are not strictly increasing: {} then {}",
                pair[0].date, pair[1].date
            )));
        }
    }
    Ok(())
}

/// Render the full calendar document for a location
#[instrument(skip_all, fields(location = %location.name, days = days.len()))]
pub fn generate(
    location: &LocationConfig,
    days: &[DailyForecast],
    generated_at: DateTime<Utc>,
) -> Result<String> {
    validate_days(days)?;

    let events = days
        .iter()
        .map(|day| CalendarEvent::from_forecast(location, day))
        .collect::<Result<Vec<_>>>()?;

    let stamp = generated_at.format(STAMP_FORMAT).to_string();

    // Calendar::new() already carries VERSION, PRODID and CALSCALE
    let mut calendar = Calendar::new();
    calendar.append_property(Property::new("METHOD", "PUBLISH"));
    calendar.append_property(Property::new(
        "X-WR-CALNAME",
        format!("Daily Weather Forecast - {}", location.name),
    ));
    calendar.append_property(Property::new("X-WR-TIMEZONE", location.timezone.name()));
    calendar.append_property(Property::new(
        "X-WR-CALDESC",
        format!("Daily weather forecast for {}", location.name),
    ));
    let mut refresh = Property::new("REFRESH-INTERVAL", REFRESH_INTERVAL);
    refresh.add_parameter("VALUE", "DURATION");
    calendar.append_property(refresh);
    calendar.append_property(Property::new("X-PUBLISHED-TTL", REFRESH_INTERVAL));

    if !location.is_all_day() {
        // validate_days guarantees both ends exist
        if let (Some(first), Some(last)) = (days.first(), days.last()) {
            timezone::append_vtimezone(&mut calendar, location.timezone, first.date, last.date);
        }
    }

    for event in &events {
        calendar.push(event.to_ical(&stamp));
    }

    let document = finish(&calendar.done().to_string());

    verify(&document, events.len())?;
    debug!(bytes = document.len(), "Rendered calendar");
    Ok(document)
}

/// Adjust the crate's rendering: our PRODID, and GEO keeps its structured
/// `lat;lon` separator instead of a TEXT-escaped one.
fn finish(rendered: &str) -> String {
    let mut document = String::with_capacity(rendered.len());
    for line in rendered.lines() {
        if line.starts_with("PRODID:") {
            document.push_str("PRODID:");
            document.push_str(PRODUCT_ID);
        } else if let Some(value) = line.strip_prefix("GEO:") {
            document.push_str("GEO:");
            document.push_str(&value.replace("\\;", ";"));
        } else {
            document.push_str(line);
        }
        document.push_str("\r\n");
    }
    document
}

/// Read the document back with the `icalendar` parser and check the event
/// count, so a malformed feed never leaves the generator.
pub fn verify(document: &str, expected_events: usize) -> Result<()> {
    let unfolded = unfold(document);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| ForecastError::format(format!("rendered calendar does not parse: {e}")))?;

    let found = count_events(&calendar.components);
    if found != expected_events {
        return Err(ForecastError::format(format!(
            "rendered calendar holds {found} events, expected {expected_events}"
        )));
    }
    Ok(())
}

fn count_events(components: &[parser::Component<'_>]) -> usize {
    components
        .iter()
        .map(|c| usize::from(c.name == "VEVENT") + count_events(&c.components))
        .sum()
}
