use std::str::FromStr;

use color_eyre::Result;
use log::warn;
use strum_macros::EnumString;

mod config;
mod extract;
mod markup;
mod merge;
mod monitor;
mod notify;
mod payload;
mod refresh;
mod schedule;
mod scraper;
mod storage;
mod teams;

use monitor::Monitor;

const USAGE: &str = "usage:
  courtside_alert test     # check clocks, Telegram and schedule sources
  courtside_alert notify   # send a sample alert
  courtside_alert once     # alert for tomorrow's games (default)
  courtside_alert update   # refresh the schedule now";

#[derive(Debug, PartialEq, EnumString)]
#[strum(serialize_all = "lowercase")]
enum Command {
    Test,
    Notify,
    Once,
    Update,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = match std::env::args().nth(1) {
        None => Command::Once,
        Some(arg) => match Command::from_str(&arg) {
            Ok(command) => command,
            Err(_) => {
                eprintln!("{USAGE}");
                return Ok(());
            }
        },
    };

    let monitor = Monitor::from_config()?;
    match command {
        Command::Test => monitor.test_connection()?,
        Command::Notify => {
            if !monitor.test_notify()? {
                warn!("Sample alert was not delivered");
            }
        }
        Command::Once => {
            let report = monitor.run_once()?;
            if report.delivered == Some(false) {
                warn!("Alert for {} games was not delivered", report.games.len());
            }
        }
        Command::Update => {
            if !monitor.update_schedule()? {
                warn!("No source answered, edit the schedule file by hand");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::from_str("once").unwrap(), Command::Once);
        assert_eq!(Command::from_str("update").unwrap(), Command::Update);
        assert!(Command::from_str("--help").is_err());
    }
}
