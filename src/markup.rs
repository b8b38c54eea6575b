use chrono::NaiveDate;
use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};

use crate::extract::extract_game;
use crate::schedule::Games;
use crate::teams::SideMatcher;

/// Visible text of an element, whitespace-trimmed fragments joined by one space.
fn flatten_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn games_for_selector(
    document: &Html,
    selector: &Selector,
    matcher: &dyn SideMatcher,
    as_of: NaiveDate,
    default_time: &str,
) -> Games {
    document
        .select(selector)
        .filter_map(|element| extract_game(&flatten_text(element), matcher, as_of, default_time))
        .collect()
}

/// Tries `selectors` in order and returns the games of the first one that
/// yields any. Results of different selectors are never combined.
pub fn parse_games(
    html: &str,
    selectors: &[&str],
    matcher: &dyn SideMatcher,
    as_of: NaiveDate,
    default_time: &str,
) -> Games {
    let document = Html::parse_document(html);

    for raw in selectors {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Skipping invalid selector {raw}: {e}");
                continue;
            }
        };

        let games = games_for_selector(&document, &selector, matcher, as_of, default_time);
        if !games.is_empty() {
            debug!("Selector {raw} matched {} games", games.len());
            return games;
        }
    }

    Games::new()
}
