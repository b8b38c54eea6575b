use std::fs;
use std::path::Path;

use color_eyre::{Result, eyre::Context};
use serde::Deserialize;

use crate::schedule::GameRecord;

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: String,
    pub aliases: Vec<String>,
}

impl Team {
    fn new(id: &str, aliases: &[&str]) -> Self {
        Self {
            id: id.into(),
            aliases: aliases.iter().map(|a| (*a).into()).collect(),
        }
    }

    /// Exact id, or any alias contained in `text`. Case-sensitive.
    pub fn appears_in(&self, text: &str) -> bool {
        text == self.id || self.aliases.iter().any(|alias| text.contains(alias.as_str()))
    }
}

/// Monitored teams in priority order. The order decides which team is
/// treated as home when a text mentions both.
#[derive(Debug, Clone)]
pub struct TeamAliases {
    teams: Vec<Team>,
}

impl Default for TeamAliases {
    fn default() -> Self {
        Self::new(vec![
            Team::new(
                "北京北汽",
                &[
                    "北京北汽",
                    "北京首钢",
                    "首钢",
                    "北汽",
                    "北京鸭",
                    "Beijing Ducks",
                    "Ducks",
                    "北京队",
                ],
            ),
            Team::new(
                "北京控股",
                &[
                    "北京控股",
                    "北控",
                    "北京北控",
                    "北控男篮",
                    "Beijing Royal Fighters",
                    "Royal Fighters",
                ],
            ),
        ])
    }
}

impl TeamAliases {
    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read teams file {}", path.display()))?;
        let teams: Vec<Team> = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("failed to parse teams file {}", path.display()))?;
        Ok(Self::new(teams))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().map(|t| t.id.as_str())
    }

    /// Canonical id of the first team whose id or aliases match `field`.
    pub fn canonicalize(&self, field: &str) -> Option<&str> {
        self.teams
            .iter()
            .find(|team| team.appears_in(field))
            .map(|team| team.id.as_str())
    }

    pub fn matches(&self, field: &str) -> bool {
        self.canonicalize(field).is_some()
    }

    pub fn is_target(&self, game: &GameRecord) -> bool {
        self.matches(&game.home_team) || self.matches(&game.away_team)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sides {
    pub home: String,
    pub away: Option<String>,
}

/// Decides which monitored teams a free-text game line is about.
pub trait SideMatcher {
    fn assign_sides(&self, text: &str) -> Option<Sides>;
}

/// Best-effort: teams are tested in configured order, the first one found
/// becomes home and the next distinct one away. Word order in `text` is not
/// consulted, so "B vs A" still yields home=A when A is configured first.
impl SideMatcher for TeamAliases {
    fn assign_sides(&self, text: &str) -> Option<Sides> {
        let mut found = self
            .teams
            .iter()
            .filter(|team| team.aliases.iter().any(|alias| text.contains(alias.as_str())))
            .map(|team| team.id.clone());

        let home = found.next()?;
        Some(Sides {
            home,
            away: found.next(),
        })
    }
}

#[cfg(test)]
pub(crate) fn alpha_beta() -> TeamAliases {
    TeamAliases::new(vec![
        Team::new("A", &["Alpha", "A-Team"]),
        Team::new("B", &["Beta"]),
    ])
}
