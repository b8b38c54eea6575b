use std::time::Duration;

use chrono::NaiveDate;
use color_eyre::{Result, eyre::eyre};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use reqwest::{StatusCode, header};
use serde_json::Value;

use crate::config::CONFIG;
use crate::merge::dedupe_into;
use crate::schedule::Games;
use crate::teams::TeamAliases;
use crate::{markup, payload};

pub static CLIENT: Lazy<Client> = Lazy::new(|| {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    Client::builder()
        .user_agent(&CONFIG.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(CONFIG.request_timeout_secs))
        .build()
        .expect("Failed to build scraping client")
});

/// Something that can GET a page body.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<String>;
}

impl Fetch for Client {
    fn get(&self, url: &str) -> Result<String> {
        let res = Client::get(self, url).send()?;
        if res.status() != StatusCode::OK {
            return Err(eyre!("{url} answered {}", res.status()));
        }
        res.text().map_err(Into::into)
    }
}

/// What a run needs to turn raw pages into records.
pub struct FetchContext<'a> {
    pub teams: &'a TeamAliases,
    /// Reference day for year inference of `M月D日` dates.
    pub as_of: NaiveDate,
    pub default_time: &'a str,
}

#[derive(Debug, Clone)]
pub enum Endpoint {
    Json(String),
    Html {
        url: String,
        selectors: &'static [&'static str],
    },
}

impl Endpoint {
    pub fn url(&self) -> &str {
        match self {
            Self::Json(url) | Self::Html { url, .. } => url.as_str(),
        }
    }

    fn games(&self, fetcher: &dyn Fetch, ctx: &FetchContext) -> Result<Games> {
        let body = fetcher.get(self.url())?;
        Ok(match self {
            Self::Json(_) => {
                let value: Value = serde_json::from_str(&body)?;
                payload::parse_games(&value, ctx.teams, ctx.as_of, ctx.default_time)
            }
            Self::Html { selectors, .. } => {
                markup::parse_games(&body, selectors, ctx.teams, ctx.as_of, ctx.default_time)
            }
        })
    }
}

/// One upstream site with its endpoints in preference order.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: &'static str,
    pub endpoints: Vec<Endpoint>,
}

const CBA_SELECTORS: &[&str] = &[
    "div.schedule-item",
    "div.match-item",
    "tr.match-row",
    r#"div[class*="game"]"#,
    r#"div[class*="match"]"#,
];

const HUPU_SELECTORS: &[&str] = &["tr.match", "div.schedule-match", "div.game-item"];

impl Source {
    pub fn cba_official() -> Self {
        Self {
            name: "cba_official",
            endpoints: vec![
                Endpoint::Json("https://www.cbaleague.com/api/schedule".into()),
                Endpoint::Json("https://www.cbaleague.com/api/match/list".into()),
                Endpoint::Html {
                    url: "https://www.cbaleague.com/schedule".into(),
                    selectors: CBA_SELECTORS,
                },
                Endpoint::Html {
                    url: "https://www.cbaleague.com/match".into(),
                    selectors: CBA_SELECTORS,
                },
            ],
        }
    }

    pub fn hupu(season: &str) -> Self {
        Self {
            name: "hupu",
            endpoints: vec![
                Endpoint::Html {
                    url: "https://cba.hupu.com/schedule".into(),
                    selectors: HUPU_SELECTORS,
                },
                Endpoint::Html {
                    url: format!("https://cba.hupu.com/schedule/{season}"),
                    selectors: HUPU_SELECTORS,
                },
            ],
        }
    }

    /// Games from the first endpoint that produces any. Failures only move
    /// on to the next endpoint; a source with no working endpoint is empty.
    pub fn fetch(&self, fetcher: &dyn Fetch, ctx: &FetchContext) -> Games {
        for endpoint in &self.endpoints {
            match endpoint.games(fetcher, ctx) {
                Ok(games) if !games.is_empty() => {
                    info!("{}: {} games from {}", self.name, games.len(), endpoint.url());
                    return games;
                }
                Ok(_) => debug!("{}: no games at {}", self.name, endpoint.url()),
                Err(e) => warn!("{}: {} failed: {e}", self.name, endpoint.url()),
            }
        }

        warn!("{}: no endpoint returned games", self.name);
        Games::new()
    }
}

pub fn default_sources(season: &str) -> Vec<Source> {
    vec![Source::cba_official(), Source::hupu(season)]
}

/// All sources, one after another. Earlier sources win over later ones for
/// the same game.
pub fn fetch_all(sources: &[Source], fetcher: &dyn Fetch, ctx: &FetchContext) -> Games {
    let mut games = Games::new();
    for source in sources {
        let batch = source.fetch(fetcher, ctx);
        dedupe_into(&mut games, batch);
    }
    games
}
