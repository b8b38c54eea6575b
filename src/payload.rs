//! Schedule entries from JSON API responses.
//!
//! The league API has renamed its keys more than once, so every field is
//! looked up under each name it has been seen with.

use chrono::NaiveDate;
use log::debug;
use serde_json::{Map, Value};

use crate::extract::normalize_date;
use crate::schedule::{GameRecord, Games};
use crate::teams::TeamAliases;

const LIST_KEYS: &[&str] = &["data", "list", "matches"];

const DATE_KEYS: &[&str] = &["date", "matchDate"];
const TIME_KEYS: &[&str] = &["time", "matchTime"];
const HOME_KEYS: &[&str] = &["home", "homeTeam", "homeName"];
const AWAY_KEYS: &[&str] = &["away", "awayTeam", "awayName"];
const VENUE_KEYS: &[&str] = &["venue", "stadium"];
const BROADCAST_KEYS: &[&str] = &["broadcast", "tv"];

fn game_list(body: &Value) -> &[Value] {
    match body {
        Value::Array(items) => items,
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    }
}

/// First present, non-null variant rendered as text. Numbers are accepted
/// since some responses send ids where names are expected.
fn field(entry: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| entry.get(*key).filter(|v| !v.is_null()))
        .and_then(|value| match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn parse_entry(
    entry: &Value,
    teams: &TeamAliases,
    as_of: NaiveDate,
    default_time: &str,
) -> Option<GameRecord> {
    let entry = entry.as_object()?;
    let date = normalize_date(&field(entry, DATE_KEYS)?, as_of)?;
    let home = field(entry, HOME_KEYS).unwrap_or_default();
    let away = field(entry, AWAY_KEYS).unwrap_or_default();

    let home_id = teams.canonicalize(&home);
    let away_id = teams.canonicalize(&away);
    match (home_id, away_id) {
        (None, None) => return None,
        (Some(h), Some(a)) if h == a => {
            debug!("Dropping self-match on {date}: {home} / {away}");
            return None;
        }
        _ => {}
    }

    Some(GameRecord {
        date,
        time: field(entry, TIME_KEYS)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| default_time.to_string()),
        home_team: home_id.map(String::from).unwrap_or(home),
        away_team: away_id.map(String::from).unwrap_or(away),
        venue: field(entry, VENUE_KEYS).unwrap_or_default(),
        broadcast: field(entry, BROADCAST_KEYS).unwrap_or_default(),
    })
}

/// Target games found in an API response body. Entries that do not parse or
/// do not involve a monitored team are skipped one by one.
pub fn parse_games(
    body: &Value,
    teams: &TeamAliases,
    as_of: NaiveDate,
    default_time: &str,
) -> Games {
    let entries = game_list(body);
    let games: Games = entries
        .iter()
        .filter_map(|entry| parse_entry(entry, teams, as_of, default_time))
        .collect();
    debug!("Parsed {} of {} API entries", games.len(), entries.len());
    games
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teams::alpha_beta;
    use serde_json::json;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 19).unwrap()
    }

    #[test]
    fn reads_each_list_key_variant() {
        let teams = alpha_beta();
        let entry = json!({"date": "2025-11-01", "home": "Alpha", "away": "Gamma"});
        for key in ["data", "list", "matches"] {
            let mut map = Map::new();
            map.insert(key.to_string(), json!([entry.clone()]));
            let body = Value::Object(map);
            assert_eq!(parse_games(&body, &teams, as_of(), "19:35").len(), 1, "key {key}");
        }
        let body = json!([entry]);
        assert_eq!(parse_games(&body, &teams, as_of(), "19:35").len(), 1);
        assert!(parse_games(&json!({"results": []}), &teams, as_of(), "19:35").is_empty());
        assert!(parse_games(&json!("nope"), &teams, as_of(), "19:35").is_empty());
    }

    #[test]
    fn maps_field_name_variants() {
        let teams = alpha_beta();
        let body = json!({"matches": [{
            "matchDate": "2025/11/2",
            "matchTime": "15:30",
            "homeName": "Gamma City",
            "awayTeam": "Team Beta",
            "stadium": "Arena",
            "tv": "CCTV-5"
        }]});

        let games = parse_games(&body, &teams, as_of(), "19:35");
        assert_eq!(
            games,
            vec![GameRecord {
                date: "2025-11-02".into(),
                time: "15:30".into(),
                home_team: "Gamma City".into(),
                away_team: "B".into(),
                venue: "Arena".into(),
                broadcast: "CCTV-5".into(),
            }]
        );
    }

    #[test]
    fn missing_time_uses_default() {
        let teams = alpha_beta();
        let body = json!({
            "data": [{"date": "2025-11-03", "homeTeam": "Alpha", "awayTeam": "Beta"}]
        });
        let games = parse_games(&body, &teams, as_of(), "19:35");
        assert_eq!(games[0].time, "19:35");
        assert_eq!((games[0].home_team.as_str(), games[0].away_team.as_str()), ("A", "B"));
    }

    #[test]
    fn bad_entries_are_skipped_individually() {
        let teams = alpha_beta();
        let body = json!({"data": [
            "not an object",
            {"date": "someday", "home": "Alpha", "away": "Beta"},
            {"home": "Alpha", "away": "Beta"},
            {"date": "2025-11-04", "home": "Gamma", "away": "Delta"},
            {"date": "2025-11-05", "home": "Alpha", "away": "A-Team"},
            {"date": "2025-11-06", "home": "Beta", "away": "Gamma"}
        ]});

        let games = parse_games(&body, &teams, as_of(), "19:35");
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].date, "2025-11-06");
        assert_eq!(games[0].home_team, "B");
    }
}
