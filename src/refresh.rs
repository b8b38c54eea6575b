use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use color_eyre::Result;
use log::{info, warn};

use crate::merge::merge_with_local;
use crate::schedule::{Games, ScheduleDocument, UpdateSource};
use crate::scraper::{Fetch, FetchContext, Source, fetch_all};
use crate::storage::ScheduleStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// Stale when the document has never been refreshed or its last refresh is
/// `interval_days` or more calendar days before `today`.
pub fn check(doc: &ScheduleDocument, today: NaiveDate, interval_days: i64) -> Freshness {
    let Some(last) = doc.last_updated_date() else {
        info!("Schedule has no usable last_updated, refreshing");
        return Freshness::Stale;
    };

    let elapsed = (today - last).num_days();
    if elapsed >= interval_days {
        info!("Schedule last refreshed {elapsed} days ago, refreshing");
        Freshness::Stale
    } else {
        info!("Schedule refreshed {elapsed} days ago, still fresh");
        Freshness::Fresh
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Not due yet; nothing fetched or written.
    Skipped,
    /// Web data merged into the stored schedule.
    Updated { games: Games },
    /// Every source came back empty; stored games kept as they were.
    LocalOnly,
}

pub struct RefreshGate<'a> {
    pub store: &'a dyn ScheduleStore,
    pub sources: &'a [Source],
    pub fetcher: &'a dyn Fetch,
    pub season: &'a str,
    pub interval_days: i64,
}

impl RefreshGate<'_> {
    /// Refreshes the stored schedule when due (or when `force` is set).
    ///
    /// A run that reaches no source still rewrites the document with a new
    /// timestamp so the next invocations do not hammer dead endpoints. Only
    /// a failed write is an error.
    pub fn run(
        &self,
        ctx: &FetchContext,
        now: DateTime<Tz>,
        force: bool,
    ) -> Result<RefreshOutcome> {
        let local = self.store.load();
        let today = now.date_naive();

        if !force && check(&local, today, self.interval_days) == Freshness::Fresh {
            return Ok(RefreshOutcome::Skipped);
        }

        info!("Refreshing schedule from {} sources", self.sources.len());
        let web = fetch_all(self.sources, self.fetcher, ctx);

        if web.is_empty() {
            warn!("No source returned games, keeping {} stored games", local.games.len());
            let doc =
                ScheduleDocument::stamped(self.season, local.games, UpdateSource::LocalOnly, now);
            self.store.save(&doc)?;
            return Ok(RefreshOutcome::LocalOnly);
        }

        let games = merge_with_local(web, local.games, today);
        let doc = ScheduleDocument::stamped(self.season, games, UpdateSource::WebAndLocal, now);
        self.store.save(&doc)?;
        info!("Schedule refreshed, {} games stored", doc.games.len());

        Ok(RefreshOutcome::Updated { games: doc.games })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::schedule::{game, parse_timestamp};
    use crate::scraper::Endpoint;
    use crate::scraper::testing::StaticFetcher;
    use crate::storage::JsonFileStore;
    use crate::storage::testing::MemoryStore;
    use crate::teams::{TeamAliases, alpha_beta};

    fn now() -> DateTime<Tz> {
        parse_timestamp("2025-10-19 20:00:00").unwrap()
    }

    fn doc_updated(days_ago: i64, games: Games) -> ScheduleDocument {
        let at = now() - TimeDelta::days(days_ago);
        ScheduleDocument::stamped("2025-2026", games, UpdateSource::Web, at)
    }

    fn api_source() -> Vec<Source> {
        vec![Source {
            name: "api",
            endpoints: vec![Endpoint::Json("http://api/schedule".into())],
        }]
    }

    fn ctx(teams: &TeamAliases) -> FetchContext<'_> {
        FetchContext {
            teams,
            as_of: now().date_naive(),
            default_time: "19:35",
        }
    }

    fn gate<'a>(
        store: &'a dyn ScheduleStore,
        sources: &'a [Source],
        fetcher: &'a StaticFetcher,
    ) -> RefreshGate<'a> {
        RefreshGate {
            store,
            sources,
            fetcher,
            season: "2025-2026",
            interval_days: 7,
        }
    }

    #[test]
    fn staleness_follows_interval() {
        let today = now().date_naive();
        assert_eq!(check(&doc_updated(8, Vec::new()), today, 7), Freshness::Stale);
        assert_eq!(check(&doc_updated(7, Vec::new()), today, 7), Freshness::Stale);
        assert_eq!(check(&doc_updated(2, Vec::new()), today, 7), Freshness::Fresh);
        assert_eq!(check(&ScheduleDocument::default(), today, 7), Freshness::Stale);
    }

    #[test]
    fn fresh_schedule_is_left_alone() {
        let store = MemoryStore::with(doc_updated(2, vec![game("2025-11-01", "A", "B")]));
        let sources = api_source();
        let fetcher = StaticFetcher::default();
        let teams = alpha_beta();

        let outcome = gate(&store, &sources, &fetcher).run(&ctx(&teams), now(), false).unwrap();
        assert_eq!(outcome, RefreshOutcome::Skipped);
        assert_eq!(*store.saves.borrow(), 0);
    }

    #[test]
    fn total_failure_keeps_local_games_and_stamps() {
        let local = vec![game("2025-11-01", "A", "Gamma"), game("2025-12-24", "B", "Delta")];
        let store = MemoryStore::with(doc_updated(8, local.clone()));
        let sources = api_source();
        let fetcher = StaticFetcher::default();
        let teams = alpha_beta();

        let outcome = gate(&store, &sources, &fetcher).run(&ctx(&teams), now(), false).unwrap();
        assert_eq!(outcome, RefreshOutcome::LocalOnly);

        let saved = store.current();
        assert_eq!(saved.games, local);
        assert_eq!(saved.update_source, Some(UpdateSource::LocalOnly));
        assert_eq!(saved.last_updated.as_deref(), Some("2025-10-19 20:00:00"));
        assert_eq!(check(&saved, now().date_naive(), 7), Freshness::Fresh);
    }

    #[test]
    fn local_only_run_keeps_readable_entries_of_hand_edited_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        std::fs::write(
            &path,
            r#"{
              "last_updated": "2025-09-01 08:00:00",
              "update_source": "manual",
              "games": [
                {"date": "2025-11-01", "time": "19:35", "home_team": "A", "away_team": "Gamma"},
                {"date": "2025-12-24", "away_team": "B"},
                {"date": "2025/12/25", "home_team": "B", "away_team": "Delta"}
              ]
            }"#,
        )
        .unwrap();
        let store = JsonFileStore::new(&path);
        let sources = api_source();
        let fetcher = StaticFetcher::default();
        let teams = alpha_beta();

        let outcome = gate(&store, &sources, &fetcher).run(&ctx(&teams), now(), false).unwrap();
        assert_eq!(outcome, RefreshOutcome::LocalOnly);

        let mut christmas = game("2025-12-25", "B", "Delta");
        christmas.time.clear();

        let saved = store.load();
        assert_eq!(saved.update_source, Some(UpdateSource::LocalOnly));
        assert_eq!(saved.games, vec![game("2025-11-01", "A", "Gamma"), christmas]);
    }

    #[test]
    fn web_results_merge_with_manual_entries() {
        let manual = game("2025-12-24", "B", "Delta");
        let stale = game("2025-09-01", "A", "Gamma");
        let store = MemoryStore::with(doc_updated(30, vec![stale, manual.clone()]));
        let sources = api_source();
        let fetcher = StaticFetcher::default().with(
            "http://api/schedule",
            r#"{"data": [{"date": "2025-11-01", "home": "Alpha", "away": "Gamma"}]}"#,
        );
        let teams = alpha_beta();

        let outcome = gate(&store, &sources, &fetcher).run(&ctx(&teams), now(), false).unwrap();
        let RefreshOutcome::Updated { games } = outcome else {
            panic!("expected an update");
        };
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].home_team, "A");
        assert_eq!(games[1], manual);

        let saved = store.current();
        assert_eq!(saved.update_source, Some(UpdateSource::WebAndLocal));
        assert_eq!(saved.games, games);
    }

    #[test]
    fn force_ignores_freshness() {
        let store = MemoryStore::with(doc_updated(0, Vec::new()));
        let sources = api_source();
        let fetcher = StaticFetcher::default();
        let teams = alpha_beta();

        let outcome = gate(&store, &sources, &fetcher).run(&ctx(&teams), now(), true).unwrap();
        assert_eq!(outcome, RefreshOutcome::LocalOnly);
        assert_eq!(*store.saves.borrow(), 1);
    }
}
