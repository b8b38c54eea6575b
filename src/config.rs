use std::path::PathBuf;

use color_eyre::eyre::Context;
use once_cell::sync::Lazy;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_schedule_path")]
    pub schedule_path: PathBuf,
    /// JSON file with `[{"id": ..., "aliases": [...]}]`. Built-in teams when unset.
    pub teams_path: Option<PathBuf>,
    #[serde(default = "default_season")]
    pub season: String,
    #[serde(default = "default_refresh_interval_days")]
    pub refresh_interval_days: i64,
    #[serde(default = "default_time")]
    pub default_time: String,
    /// Toronto hour the external scheduler is expected to run `once` at.
    #[serde(default = "default_notification_hour")]
    pub notification_hour: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
}

fn default_schedule_path() -> PathBuf {
    "schedule.json".into()
}

fn default_season() -> String {
    "2025-2026".into()
}

const fn default_refresh_interval_days() -> i64 {
    7
}

fn default_time() -> String {
    "19:35".into()
}

const fn default_notification_hour() -> u32 {
    20
}

const fn default_request_timeout_secs() -> u64 {
    15
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    envy::from_env::<Config>()
        .wrap_err("failed to load config")
        .unwrap()
});
