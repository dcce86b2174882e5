//! Change detection between a stored feed and a freshly rendered one
//!
//! Regenerating with unchanged weather only moves the stamp properties, so
//! both documents are compared with those properties removed.

use icalendar::parser::unfold;

/// Properties that carry the generation timestamp
pub const STAMP_PROPERTIES: [&str; 2] = ["DTSTAMP", "LAST-MODIFIED"];

fn is_stamp_line(line: &str) -> bool {
    STAMP_PROPERTIES.iter().any(|name| {
        line.strip_prefix(name)
            .is_some_and(|rest| rest.starts_with(':') || rest.starts_with(';'))
    })
}

/// Unfold a document and drop its stamp properties.
///
/// Line endings are normalized to `\n` so a file that went through a
/// CRLF-to-LF conversion still compares equal.
#[must_use]
pub fn normalize(document: &str) -> String {
    unfold(document)
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !is_stamp_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether `next` should replace `previous`
#[must_use]
pub fn has_changed(previous: Option<&str>, next: &str) -> bool {
    previous.is_none_or(|previous| normalize(previous) != normalize(next))
}
