use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schedule::{DATE_FORMAT, GameRecord, OPPONENT_TBD};
use crate::teams::SideMatcher;

static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})").unwrap());
static LOCALIZED_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})月(\d{1,2})日").unwrap());
static KICKOFF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}:\d{2}").unwrap());

fn canonical(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format(DATE_FORMAT).to_string())
}

fn numeric_date(text: &str) -> Option<String> {
    let caps = NUMERIC_DATE.captures(text)?;
    canonical(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn localized_date(text: &str, as_of: NaiveDate) -> Option<String> {
    let caps = LOCALIZED_DATE.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year = if month < as_of.month() {
        as_of.year() + 1
    } else {
        as_of.year()
    };
    canonical(year, month, day)
}

/// First date found in `text`, canonicalized.
///
/// A valid `YYYY-M-D` / `YYYY/M/D` wins over `M月D日`; an impossible numeric
/// date does not hide a localized one. A localized date carries no year: it
/// takes the year of `as_of`, or the next one when its month is already
/// behind `as_of`'s month. That guess is wrong for games earlier in the
/// current year, which is acceptable for an upcoming-games feed.
pub fn find_date(text: &str, as_of: NaiveDate) -> Option<String> {
    numeric_date(text).or_else(|| localized_date(text, as_of))
}

/// Canonical form of a date that already carries its year, as stored
/// documents do (`2025/11/2` → `2025-11-02`).
pub fn canonical_date(raw: &str) -> Option<String> {
    numeric_date(raw.trim())
}

/// Normalizes a standalone date field (`2025/3/5`, `2025-03-05`,
/// `2025-03-05 19:35`, `3月5日`). `None` for anything else.
pub fn normalize_date(raw: &str, as_of: NaiveDate) -> Option<String> {
    find_date(raw.trim(), as_of)
}

pub fn find_time(text: &str) -> Option<&str> {
    KICKOFF.find(text).map(|m| m.as_str())
}

/// Builds a record from one flattened schedule row. `None` means the row is
/// not a game of a monitored team (no date, or no known team).
pub fn extract_game(
    text: &str,
    matcher: &dyn SideMatcher,
    as_of: NaiveDate,
    default_time: &str,
) -> Option<GameRecord> {
    let date = find_date(text, as_of)?;
    let sides = matcher.assign_sides(text)?;

    Some(GameRecord {
        date,
        time: find_time(text).unwrap_or(default_time).to_string(),
        home_team: sides.home,
        away_team: sides.away.unwrap_or_else(|| OPPONENT_TBD.to_string()),
        venue: String::new(),
        broadcast: String::new(),
    })
}
