//! End-to-end rendering of forecast feeds

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use icalendar::parser::{Component, read_calendar, unfold};

use forecast_ics::{
    CalendarEvent, DailyForecast, ForecastError, LocationConfig, generate, has_changed,
};

fn athens() -> LocationConfig {
    LocationConfig::new("Athens", 37.9838, 23.7275, chrono_tz::Europe::Athens)
        .with_link_url("https://example.org/athens")
}

fn three_days() -> Vec<DailyForecast> {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    [(18.0, 27.0, 10, 0.0, 12.0), (19.0, 28.0, 0, 0.0, 8.0), (17.0, 25.0, 60, 4.0, 20.0)]
        .into_iter()
        .enumerate()
        .map(|(offset, (low, high, probability, rain, wind))| {
            DailyForecast::new(
                start + Duration::days(offset as i64),
                low,
                high,
                probability,
                rain,
                wind,
            )
        })
        .collect()
}

fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap()
}

fn property(component: &Component<'_>, name: &str) -> Option<String> {
    component.find_prop(name).map(|p| p.val.to_string())
}

/// Undo RFC 5545 TEXT escaping; unknown escapes keep their backslash
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped @ ('\\' | ',' | ';')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn collect_events<'a>(components: &'a [Component<'a>], found: &mut Vec<&'a Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            found.push(component);
        }
        collect_events(&component.components, found);
    }
}

type ParsedEvent = (Option<String>, Option<String>, Option<String>, Option<String>);

fn events(document: &str) -> Vec<ParsedEvent> {
    let unfolded = unfold(document);
    let calendar = read_calendar(&unfolded).unwrap();
    let mut found = Vec::new();
    collect_events(&calendar.components, &mut found);
    found
        .into_iter()
        .map(|c| {
            (
                property(c, "UID"),
                property(c, "DTSTART"),
                property(c, "SUMMARY"),
                property(c, "DESCRIPTION"),
            )
        })
        .collect()
}

#[test]
fn athens_three_day_scenario() {
    let document = generate(&athens(), &three_days(), generated_at()).unwrap();
    let events = events(&document);

    assert_eq!(events.len(), 3);
    let starts: Vec<_> = events.iter().map(|e| e.1.clone().unwrap()).collect();
    assert_eq!(starts, ["20240601", "20240602", "20240603"]);

    let first_summary = events[0].2.as_deref().unwrap();
    assert!(first_summary.contains("Athens"));
    assert!(first_summary.contains("27"));
    assert!(first_summary.contains("18"));

    let uids: HashSet<_> = events.iter().map(|e| e.0.clone().unwrap()).collect();
    assert_eq!(uids.len(), 3);

    assert!(document.contains("DTSTART;VALUE=DATE:20240601\r\n"));
    assert!(document.contains("DTEND;VALUE=DATE:20240602\r\n"));
    assert!(!document.contains("BEGIN:VTIMEZONE"));
    assert!(document.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
    assert!(document.ends_with("END:VCALENDAR\r\n"));
}

#[test]
fn rendering_is_idempotent() {
    let location = athens();
    let days = three_days();

    let first = generate(&location, &days, generated_at()).unwrap();
    let second = generate(&location, &days, generated_at()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn only_stamps_differ_between_runs() {
    let location = athens();
    let days = three_days();

    let morning = generate(&location, &days, generated_at()).unwrap();
    let evening = generate(&location, &days, generated_at() + Duration::hours(12)).unwrap();
    assert_ne!(morning, evening);

    for (before, after) in morning.lines().zip(evening.lines()) {
        if before != after {
            assert!(
                before.starts_with("DTSTAMP:") || before.starts_with("LAST-MODIFIED:"),
                "unexpected difference: {before}"
            );
        }
    }
    assert!(!has_changed(Some(&morning), &evening));
}

#[test]
fn text_escaping_round_trips_through_the_parser() {
    let location = LocationConfig::new(
        "Athens, Attica; Greece",
        37.9838,
        23.7275,
        chrono_tz::Europe::Athens,
    );
    let days = three_days();
    let document = generate(&location, &days, generated_at()).unwrap();

    assert!(document.contains("Athens\\, Attica\\; Greece"));

    let expected = CalendarEvent::from_forecast(&location, &days[0]).unwrap();
    let events = events(&document);
    assert_eq!(unescape_text(events[0].2.as_deref().unwrap()), expected.summary);
    assert_eq!(unescape_text(events[0].3.as_deref().unwrap()), expected.description);
}

#[test]
fn control_characters_and_backslashes_round_trip() {
    let location = LocationConfig::new(
        "C:\\dir\nnext, a; b",
        37.9838,
        23.7275,
        chrono_tz::Europe::Athens,
    )
    .with_link_url("https://example.org/C:\\dir\nnext, a; b");
    let days = three_days();
    let document = generate(&location, &days, generated_at()).unwrap();

    assert!(document.contains("C:\\\\dir\\nnext\\, a\\; b"));

    let events = events(&document);
    for (event, day) in events.iter().zip(&days) {
        let expected = CalendarEvent::from_forecast(&location, day).unwrap();
        assert_eq!(unescape_text(event.2.as_deref().unwrap()), expected.summary);
        assert_eq!(unescape_text(event.3.as_deref().unwrap()), expected.description);
    }
}

#[test]
fn structured_values_are_not_text_escaped() {
    let document = generate(&athens(), &three_days(), generated_at()).unwrap();

    assert!(document.contains("GEO:37.9838;23.7275\r\n"));
    assert!(document.contains("PRODID:"));
    assert!(document.contains("REFRESH-INTERVAL;VALUE=DURATION:"));
}

#[test]
fn timed_events_carry_a_timezone() {
    let location = athens().with_event_time(NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    let document = generate(&location, &three_days(), generated_at()).unwrap();

    assert!(document.contains("BEGIN:VTIMEZONE\r\nTZID:Europe/Athens\r\n"));
    assert!(document.contains("DTSTART;TZID=Europe/Athens:20240601T070000\r\n"));
    assert!(document.contains("DTEND;TZID=Europe/Athens:20240601T071500\r\n"));
    assert_eq!(events(&document).len(), 3);
}

#[test]
fn long_lines_are_folded_and_unfold_intact() {
    let location = LocationConfig::new(
        "Αθήνα και περίχωρα, Αττική",
        37.9838,
        23.7275,
        chrono_tz::Europe::Athens,
    )
    .with_link_url("https://example.org/a/very/long/path/that/keeps/going/and/going/forecast");
    let days = three_days();
    let document = generate(&location, &days, generated_at()).unwrap();

    assert!(document.contains("\r\n "));

    let expected = CalendarEvent::from_forecast(&location, &days[0]).unwrap();
    let events = events(&document);
    assert_eq!(unescape_text(events[0].3.as_deref().unwrap()), expected.description);
}

#[test]
fn empty_forecast_is_rejected() {
    let result = generate(&athens(), &[], generated_at());
    assert!(matches!(result, Err(ForecastError::Validation { .. })));
}
