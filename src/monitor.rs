use chrono::{DateTime, TimeDelta};
use chrono_tz::{America::Toronto, Tz};
use color_eyre::Result;
use log::info;

use crate::config::CONFIG;
use crate::notify::{format_game_message, notify};
use crate::refresh::{RefreshGate, RefreshOutcome};
use crate::schedule::{
    DATE_FORMAT, GameRecord, Games, TIMESTAMP_FORMAT, filter_targets, games_on, now_in_league_tz,
    tomorrow,
};
use crate::scraper::{CLIENT, FetchContext, Source, default_sources};
use crate::storage::{JsonFileStore, ScheduleStore};
use crate::teams::TeamAliases;

/// What an alert run found and whether the alert reached Telegram.
#[derive(Debug, PartialEq)]
pub struct RunReport {
    pub games: Games,
    /// `None` when there was nothing to send.
    pub delivered: Option<bool>,
}

/// Sends one alert covering the games of the day after `now`.
fn alert_tomorrow(
    targets: &[GameRecord],
    now: DateTime<Tz>,
    default_time: &str,
    send: impl Fn(&str) -> bool,
) -> RunReport {
    let date = tomorrow(now);
    let upcoming: Vec<&GameRecord> = games_on(targets, &date);

    let Some(message) = format_game_message(&upcoming, now, default_time) else {
        info!("No games on {date}");
        return RunReport {
            games: Games::new(),
            delivered: None,
        };
    };

    info!("{} games on {date}, sending alert", upcoming.len());
    RunReport {
        games: upcoming.into_iter().cloned().collect(),
        delivered: Some(send(&message)),
    }
}

/// Everything one invocation works with, resolved from `CONFIG` once.
pub struct Monitor {
    teams: TeamAliases,
    store: JsonFileStore,
    sources: Vec<Source>,
}

impl Monitor {
    pub fn from_config() -> Result<Self> {
        let teams = match &CONFIG.teams_path {
            Some(path) => TeamAliases::load(path)?,
            None => TeamAliases::default(),
        };
        Ok(Self {
            teams,
            store: JsonFileStore::new(&CONFIG.schedule_path),
            sources: default_sources(&CONFIG.season),
        })
    }

    fn gate(&self) -> RefreshGate<'_> {
        RefreshGate {
            store: &self.store,
            sources: &self.sources,
            fetcher: &*CLIENT,
            season: &CONFIG.season,
            interval_days: CONFIG.refresh_interval_days,
        }
    }

    fn refresh(&self, now: DateTime<Tz>, force: bool) -> Result<RefreshOutcome> {
        let ctx = FetchContext {
            teams: &self.teams,
            as_of: now.date_naive(),
            default_time: &CONFIG.default_time,
        };
        self.gate().run(&ctx, now, force)
    }

    /// Stored games, refreshed first if the refresh interval has passed.
    pub fn schedule(&self, now: DateTime<Tz>) -> Result<Games> {
        self.refresh(now, false)?;
        Ok(self.store.load().games)
    }

    /// Checks tomorrow's games and sends the alert if there are any.
    pub fn run_once(&self) -> Result<RunReport> {
        let now = now_in_league_tz();
        info!("Checking CBA schedule");

        let all = self.schedule(now)?;
        let targets = filter_targets(&all, &self.teams);
        info!("{} stored games, {} for monitored teams", all.len(), targets.len());

        Ok(alert_tomorrow(&targets, now, &CONFIG.default_time, notify))
    }

    /// Forced refresh. `true` when web data was stored.
    pub fn update_schedule(&self) -> Result<bool> {
        let outcome = self.refresh(now_in_league_tz(), true)?;
        Ok(matches!(outcome, RefreshOutcome::Updated { .. }))
    }

    pub fn test_connection(&self) -> Result<()> {
        let now = now_in_league_tz();
        println!("1. Clocks");
        println!("   Toronto: {}", now.with_timezone(&Toronto).format(TIMESTAMP_FORMAT));
        println!("   Beijing: {}", now.format(TIMESTAMP_FORMAT));
        println!("   Alert run expected at {:02}:00 Toronto", CONFIG.notification_hour);

        println!("2. Telegram");
        let ids: Vec<_> = self.teams.ids().collect();
        let message = format!("🏀 CBA比赛监控测试\n\n监控球队：{}\n连接成功！", ids.join("、"));
        if notify(&message) {
            println!("   ok");
        } else {
            println!("   failed, check TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID");
        }

        println!("3. Schedule");
        let games = self.schedule(now)?;
        if games.is_empty() {
            println!(
                "   no games known, add them by hand to {}",
                self.store.path().display()
            );
        } else {
            let targets = filter_targets(&games, &self.teams);
            println!("   {} games, {} for monitored teams", games.len(), targets.len());
        }
        Ok(())
    }

    /// Sends a made-up alert for two games tomorrow.
    pub fn test_notify(&self) -> Result<bool> {
        let now = now_in_league_tz();
        let date = (now + TimeDelta::days(1)).format(DATE_FORMAT).to_string();
        let samples = sample_games(&date);
        let refs: Vec<&GameRecord> = samples.iter().collect();

        let Some(message) = format_game_message(&refs, now, &CONFIG.default_time) else {
            return Ok(false);
        };
        println!("{}", message.replace("<b>", "").replace("</b>", ""));
        Ok(notify(&message))
    }
}

fn sample_games(date: &str) -> Games {
    vec![
        GameRecord {
            date: date.into(),
            time: "19:35".into(),
            home_team: "北京北汽".into(),
            away_team: "广东东莞".into(),
            venue: "首钢篮球中心".into(),
            broadcast: "CCTV-5、咪咕视频".into(),
        },
        GameRecord {
            date: date.into(),
            time: "15:30".into(),
            home_team: "北京控股".into(),
            away_team: "浙江稠州".into(),
            venue: "北京奥体中心".into(),
            broadcast: "咪咕视频、抖音".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::schedule::{game, parse_timestamp};

    #[test]
    fn failed_delivery_is_reported() {
        let now = parse_timestamp("2025-10-19 20:00:00").unwrap();
        let targets = vec![
            game("2025-10-20", "北京北汽", "广东东莞"),
            game("2025-10-21", "北京控股", ""),
        ];

        let report = alert_tomorrow(&targets, now, "19:35", |_| false);
        assert_eq!(report.delivered, Some(false));
        assert_eq!(report.games, vec![targets[0].clone()]);

        let sent = RefCell::new(Vec::new());
        let report = alert_tomorrow(&targets, now, "19:35", |text| {
            sent.borrow_mut().push(text.to_string());
            true
        });
        assert_eq!(report.delivered, Some(true));
        assert_eq!(sent.borrow().len(), 1);
        assert!(sent.borrow()[0].contains("广东东莞 @ 北京北汽"));
    }

    #[test]
    fn no_games_tomorrow_sends_nothing() {
        let now = parse_timestamp("2025-10-19 20:00:00").unwrap();
        let targets = vec![game("2025-10-25", "北京北汽", "广东东莞")];

        let report = alert_tomorrow(&targets, now, "19:35", |_| panic!("nothing to send"));
        assert_eq!(report.delivered, None);
        assert!(report.games.is_empty());
    }

    #[test]
    fn samples_are_both_for_the_given_day() {
        let samples = sample_games("2025-10-20");
        assert_eq!(games_on(&samples, "2025-10-20").len(), 2);
    }
}
