use std::time::Duration;

use chrono::{DateTime, Datelike, TimeDelta};
use chrono_tz::Tz;
use color_eyre::Result;
use log::{error, info};
use serde::Serialize;

use crate::config::CONFIG;
use crate::schedule::GameRecord;
use crate::scraper::CLIENT;

const EMOJI_BALL: &str = "🏀";
const EMOJI_CALENDAR: &str = "📅";
const EMOJI_CLOCK: &str = "⏰";
const EMOJI_VERSUS: &str = "🆚";
const EMOJI_PIN: &str = "📍";
const EMOJI_TV: &str = "📺";
const EMOJI_BULB: &str = "💡";

const WEEKDAYS: [&str; 7] = ["周一", "周二", "周三", "周四", "周五", "周六", "周日"];

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

fn escape_html(text: &str) -> String {
    text.chars()
        .fold(String::with_capacity(text.len()), |mut out, c| {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(c),
            }
            out
        })
}

fn or_unknown(text: &str) -> String {
    if text.is_empty() {
        "未知".into()
    } else {
        escape_html(text)
    }
}

fn render_game(index: usize, game: &GameRecord, default_time: &str) -> String {
    let mut block = format!(
        "<b>比赛 {index}</b>\n{EMOJI_CLOCK} 北京时间: {}\n{EMOJI_VERSUS} {} @ {}\n",
        escape_html(game.time_or(default_time)),
        or_unknown(&game.away_team),
        or_unknown(&game.home_team),
    );
    if !game.venue.is_empty() {
        block.push_str(&format!("{EMOJI_PIN} 地点: {}\n", escape_html(&game.venue)));
    }
    block.push_str(&format!(
        "{EMOJI_TV} 直播: {}\n\n",
        escape_html(game.broadcast_or_default())
    ));
    block
}

/// Alert for tomorrow's games, relative to `now` in league time. Records
/// stored without a kickoff show `default_time`. `None` when there is
/// nothing to announce.
pub fn format_game_message(
    games: &[&GameRecord],
    now: DateTime<Tz>,
    default_time: &str,
) -> Option<String> {
    if games.is_empty() {
        return None;
    }

    let tomorrow = now + TimeDelta::days(1);
    let weekday = WEEKDAYS[tomorrow.weekday().num_days_from_monday() as usize];

    let mut message = format!("{EMOJI_BALL} <b>CBA比赛提醒</b>\n\n");
    message.push_str(&format!(
        "{EMOJI_CALENDAR} 明天 ({} {weekday}) 有以下比赛：\n\n",
        tomorrow.format("%m月%d日")
    ));
    for (i, game) in games.iter().enumerate() {
        message.push_str(&render_game(i + 1, game, default_time));
    }
    message.push_str(&format!("{EMOJI_BULB} 记得提前调好闹钟！"));

    Some(message)
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

pub fn send_telegram_message(text: &str) -> Result<()> {
    let url = format!(
        "https://api.telegram.org/bot{}/sendMessage",
        CONFIG.telegram_bot_token
    );
    let payload = SendMessage {
        chat_id: &CONFIG.telegram_chat_id,
        text,
        parse_mode: "HTML",
    };

    CLIENT
        .post(url)
        .timeout(SEND_TIMEOUT)
        .json(&payload)
        .send()?
        .error_for_status()?;

    Ok(())
}

/// One delivery attempt; the outcome is logged and returned, never retried.
pub fn notify(text: &str) -> bool {
    match send_telegram_message(text) {
        Ok(()) => {
            info!("Telegram message sent");
            true
        }
        Err(e) => {
            error!("Telegram message failed: {e}");
            false
        }
    }
}
