//! Filename conventions for chained notes.
//!
//! Two dialects are recognized:
//! - date notes, `YYYYMMDD.md` (optionally preceded by a free-form prefix),
//! - sequence notes, `<letters>NN.md` / `<letters>NNN.md`.
//!
//! Hierarchy is expressed with a fixed `index.md` per directory and
//! `_<name>` child notes. Everything in here is pure string work.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

/// Fixed name of a directory's parent entry point.
pub const INDEX_NOTE: &str = "index.md";

/// Prefix marking a child (detail) note.
pub const CHILD_MARKER: char = '_';

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(\d{4})(\d{2})(\d{2})\.md$").expect("date pattern"));

static SEQUENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_-]+)(\d{2,3})\.md$").expect("sequence pattern"));

static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_-]+$").expect("prefix pattern"));

/// A parsed date note name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateName {
    /// Anything in front of the eight digits; empty for plain `YYYYMMDD.md`.
    pub prefix: String,
    pub date: NaiveDate,
}

impl DateName {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.prefix, format_date_name(self.date))
    }

    /// Move by `days` calendar days; `None` when the date leaves chrono's range.
    pub fn shifted(&self, days: i64) -> Option<DateName> {
        let date = self.date.checked_add_signed(Duration::try_days(days)?)?;
        Some(DateName {
            prefix: self.prefix.clone(),
            date,
        })
    }

    /// Name of the month aggregate note, `YYYYMM.md`.
    pub fn month_note_name(&self) -> String {
        format!(
            "{}{:04}{:02}.md",
            self.prefix,
            self.date.year(),
            self.date.month()
        )
    }
}

/// A parsed sequence note name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceName {
    pub prefix: String,
    /// Digits exactly as written, so zero padding survives a round trip.
    pub number_text: String,
    pub number: u32,
}

impl SequenceName {
    pub fn width(&self) -> usize {
        self.number_text.len()
    }

    pub fn file_name(&self) -> String {
        format_sequence_name(&self.prefix, self.number, self.width())
    }

    /// Step by `delta`; `None` when the result would be negative.
    pub fn shifted(&self, delta: i64) -> Option<u32> {
        let next = i64::from(self.number).checked_add(delta)?;
        u32::try_from(next).ok()
    }
}

/// Parse a trailing `YYYYMMDD.md`. Impossible calendar dates do not parse.
pub fn parse_date_name(name: &str) -> Option<DateName> {
    let caps = DATE_RE.captures(name)?;
    let year: i32 = caps[2].parse().ok()?;
    let month: u32 = caps[3].parse().ok()?;
    let day: u32 = caps[4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(DateName {
        prefix: caps[1].to_string(),
        date,
    })
}

/// Parse `<prefix><2-3 digits>.md`.
pub fn parse_sequence_name(name: &str) -> Option<SequenceName> {
    let caps = SEQUENCE_RE.captures(name)?;
    let number_text = caps[2].to_string();
    let number = number_text.parse().ok()?;
    Some(SequenceName {
        prefix: caps[1].to_string(),
        number_text,
        number,
    })
}

/// `YYYYMMDD.md`, zero padded.
pub fn format_date_name(date: NaiveDate) -> String {
    format!(
        "{:04}{:02}{:02}.md",
        date.year(),
        date.month(),
        date.day()
    )
}

/// `<prefix><number>.md` with the number padded to at least `width` digits.
/// Numbers wider than `width` are written in full, never truncated.
pub fn format_sequence_name(prefix: &str, number: u32, width: usize) -> String {
    format!("{}{:0width$}.md", prefix, number, width = width)
}

/// True when `prefix` can head a sequence note name.
pub fn is_sequence_prefix(prefix: &str) -> bool {
    PREFIX_RE.is_match(prefix)
}

/// Auto-generated chain notes stay out of the recent-files list.
pub fn is_history_excluded(name: &str) -> bool {
    parse_date_name(name).is_some() || SEQUENCE_RE.is_match(name)
}

/// `_<name>`: the child note one level below `name`.
pub fn child_name(name: &str) -> String {
    format!("{}{}", CHILD_MARKER, name)
}

/// Shift a date note name by `days`.
pub fn shift_date_name(name: &str, days: i64) -> Option<String> {
    parse_date_name(name)?.shifted(days).map(|d| d.file_name())
}

/// Shift a sequence note name by `delta`, preserving its padding width.
pub fn shift_sequence_name(name: &str, delta: i64) -> Option<String> {
    let seq = parse_sequence_name(name)?;
    let next = seq.shifted(delta)?;
    Some(format_sequence_name(&seq.prefix, next, seq.width()))
}
