use chrono::NaiveDate;
use log::debug;

use crate::schedule::{GameRecord, Games};

fn contains_duplicate(games: &[GameRecord], game: &GameRecord) -> bool {
    games.iter().any(|existing| existing.is_duplicate_of(game))
}

/// Appends the games of `batch` that `acc` does not already hold. Whatever is
/// in `acc` first wins.
pub fn dedupe_into(acc: &mut Games, batch: Games) {
    for game in batch {
        if !contains_duplicate(acc, &game) {
            acc.push(game);
        }
    }
}

pub fn dedupe(games: Games) -> Games {
    let mut out = Games::with_capacity(games.len());
    dedupe_into(&mut out, games);
    out
}

/// Web games followed by the local games the web did not report, sorted by
/// date.
///
/// Local-only games are kept when they are dated `today` or later, which
/// keeps hand-added fixtures while letting played games fall out of the
/// file. Local entries whose date cannot be read are dropped.
pub fn merge_with_local(web: Games, local: Games, today: NaiveDate) -> Games {
    let mut merged = dedupe(web);
    let web_count = merged.len();

    for game in local {
        if contains_duplicate(&merged, &game) {
            continue;
        }
        match game.parsed_date() {
            Some(date) if date >= today => merged.push(game),
            Some(_) => debug!(
                "Pruning past game {} {} vs {}",
                game.date, game.home_team, game.away_team
            ),
            None => debug!("Pruning local game with unreadable date {:?}", game.date),
        }
    }

    let kept = merged.len() - web_count;
    debug!("Kept {kept} local-only games next to {web_count} from the web");
    merged.sort_by(|a, b| a.date.cmp(&b.date));
    merged
}
