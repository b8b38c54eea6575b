use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeDelta};
use chrono_tz::{Asia::Shanghai, Tz};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};

use crate::extract::canonical_date;
use crate::teams::TeamAliases;

/// Dates, kickoff times and `last_updated` are all Beijing time.
pub const LEAGUE_TZ: Tz = Shanghai;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Away side of a record whose opponent could not be read.
pub const OPPONENT_TBD: &str = "对手待定";

pub const DEFAULT_BROADCAST: &str = "CCTV-5/CCTV-5+、咪咕视频、央视频、抖音（请以实际播出为准）";

const DOCUMENT_NOTE: &str = "此文件由程序自动更新，也可手动编辑添加比赛。";

pub type Games = Vec<GameRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub date: String,
    #[serde(default)]
    pub time: String,
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub broadcast: String,
}

impl GameRecord {
    /// Same date and same sides, in the same order.
    pub fn is_duplicate_of(&self, other: &GameRecord) -> bool {
        self.date == other.date
            && self.home_team == other.home_team
            && self.away_team == other.away_team
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    /// Kickoff time, or `default` for records stored without one.
    pub fn time_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.time.is_empty() {
            default
        } else {
            &self.time
        }
    }

    pub fn broadcast_or_default(&self) -> &str {
        if self.broadcast.is_empty() {
            DEFAULT_BROADCAST
        } else {
            &self.broadcast
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum UpdateSource {
    #[serde(rename = "web")]
    #[strum(to_string = "web")]
    Web,
    #[serde(rename = "web+local")]
    #[strum(to_string = "web+local")]
    WebAndLocal,
    #[serde(rename = "local_only")]
    #[strum(to_string = "local_only")]
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDocument {
    pub season: String,
    pub last_updated: Option<String>,
    pub update_source: Option<UpdateSource>,
    pub note: String,
    pub games: Games,
}

/// One stored game, or `None` (logged) when the entry is unusable.
fn stored_game(entry: &Value) -> Option<GameRecord> {
    let mut game = match GameRecord::deserialize(entry) {
        Ok(game) => game,
        Err(e) => {
            warn!("Skipping stored game {entry} ({e})");
            return None;
        }
    };

    let Some(date) = canonical_date(&game.date) else {
        warn!("Skipping stored game with unreadable date {:?}", game.date);
        return None;
    };
    game.date = date;
    Some(game)
}

impl Default for ScheduleDocument {
    fn default() -> Self {
        Self {
            season: String::new(),
            last_updated: None,
            update_source: None,
            note: DOCUMENT_NOTE.into(),
            games: Vec::new(),
        }
    }
}

impl ScheduleDocument {
    /// Reads a stored document field by field. A hand-edited entry that is
    /// missing a field or carries an odd date is dropped on its own, and an
    /// unknown provenance tag reads as absent.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str);

        let games = value
            .get("games")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(stored_game).collect())
            .unwrap_or_default();

        Self {
            season: text("season").unwrap_or_default().to_string(),
            last_updated: text("last_updated").map(str::to_string),
            update_source: text("update_source").and_then(|s| UpdateSource::from_str(s).ok()),
            note: text("note").unwrap_or(DOCUMENT_NOTE).to_string(),
            games,
        }
    }

    pub fn stamped(
        season: &str,
        games: Games,
        source: UpdateSource,
        now: DateTime<Tz>,
    ) -> Self {
        Self {
            season: season.into(),
            last_updated: Some(now.format(TIMESTAMP_FORMAT).to_string()),
            update_source: Some(source),
            note: DOCUMENT_NOTE.into(),
            games,
        }
    }

    /// Calendar day of the last refresh. Only the date part is read so that
    /// hand-edited timestamps like `2025-10-01` still count.
    pub fn last_updated_date(&self) -> Option<NaiveDate> {
        let raw = self.last_updated.as_deref()?;
        let day = raw.split_whitespace().next()?;
        NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
    }
}

pub fn now_in_league_tz() -> DateTime<Tz> {
    chrono::Utc::now().with_timezone(&LEAGUE_TZ)
}

#[cfg(test)]
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Tz>> {
    use chrono::{NaiveDateTime, TimeZone};

    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()?;
    LEAGUE_TZ.from_local_datetime(&naive).single()
}

/// Tomorrow's date in league time, canonical form.
pub fn tomorrow(now: DateTime<Tz>) -> String {
    (now + TimeDelta::days(1)).format(DATE_FORMAT).to_string()
}

pub fn games_on<'a>(games: &'a [GameRecord], date: &str) -> Vec<&'a GameRecord> {
    games.iter().filter(|g| g.date == date).collect()
}

pub fn filter_targets(games: &[GameRecord], teams: &TeamAliases) -> Games {
    games
        .iter()
        .filter(|g| teams.is_target(g))
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) fn game(date: &str, home: &str, away: &str) -> GameRecord {
    GameRecord {
        date: date.into(),
        time: "19:35".into(),
        home_team: home.into(),
        away_team: away.into(),
        venue: String::new(),
        broadcast: String::new(),
    }
}
