//! Command line and environment configuration.
//!
//! Every setting can come from a flag or a `CAMPUSQ_*` variable; a `.env`
//! file in the working directory is read first. Flags win over the
//! environment.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::poller::NotifyMode;

#[derive(Debug, Parser)]
#[command(name = "campusq")]
#[command(about = "Campus service queues with wait estimates and turn notifications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub settings: Settings,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API and the notification poller (default)
    Serve,
    /// Create an admin account, or promote an existing one
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Clone, Debug, Args)]
pub struct Settings {
    /// Address the HTTP server listens on
    #[arg(long, global = true, env = "CAMPUSQ_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// SQLite database file
    #[arg(long, global = true, env = "CAMPUSQ_DATABASE", default_value = "./campusq.sqlite3")]
    pub database: PathBuf,

    /// How often the head of every queue is notified, e.g. "30s"
    #[arg(
        long,
        global = true,
        env = "CAMPUSQ_POLL_INTERVAL",
        default_value = "30s",
        value_parser = parse_period
    )]
    pub poll_interval: Duration,

    /// How long a login stays valid, e.g. "7days"
    #[arg(
        long,
        global = true,
        env = "CAMPUSQ_TOKEN_TTL",
        default_value = "7days",
        value_parser = parse_period
    )]
    pub token_ttl: Duration,

    /// Origin allowed to call the API from a browser
    #[arg(
        long,
        global = true,
        env = "CAMPUSQ_CORS_ORIGIN",
        default_value = "http://localhost:3000"
    )]
    pub cors_origin: String,

    /// Notify the head of line on every tick, or only when it changes
    #[arg(
        long,
        global = true,
        env = "CAMPUSQ_NOTIFY_MODE",
        value_enum,
        default_value_t = NotifyMode::EveryTick
    )]
    pub notify_mode: NotifyMode,

    /// One of off, error, warn, info, debug, trace
    #[arg(
        long,
        global = true,
        env = "CAMPUSQ_LOG_LEVEL",
        default_value = "info",
        value_parser = parse_level
    )]
    pub log_level: LevelFilter,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database: PathBuf::from("./campusq.sqlite3"),
            poll_interval: Duration::from_secs(30),
            token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            cors_origin: "http://localhost:3000".to_owned(),
            notify_mode: NotifyMode::EveryTick,
            log_level: LevelFilter::Info,
        }
    }
}

/// A humantime duration that isn't zero.
fn parse_period(s: &str) -> Result<Duration, String> {
    let period = humantime::parse_duration(s).map_err(|err| err.to_string())?;
    if period.is_zero() {
        return Err("must be longer than zero".to_owned());
    }
    Ok(period)
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("unknown log level: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let cli = Cli::try_parse_from(["campusq"]).unwrap();
        let defaults = Settings::default();

        assert!(cli.command.is_none());
        assert_eq!(cli.settings.bind, defaults.bind);
        assert_eq!(cli.settings.poll_interval, defaults.poll_interval);
        assert_eq!(cli.settings.token_ttl, defaults.token_ttl);
        assert_eq!(cli.settings.notify_mode, defaults.notify_mode);
        assert_eq!(cli.settings.log_level, defaults.log_level);
    }

    #[test]
    fn durations_use_humantime() {
        let cli = Cli::try_parse_from([
            "campusq",
            "serve",
            "--poll-interval",
            "5s",
            "--token-ttl",
            "1h 30m",
            "--notify-mode",
            "on-change",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.settings.poll_interval, Duration::from_secs(5));
        assert_eq!(cli.settings.token_ttl, Duration::from_secs(90 * 60));
        assert_eq!(cli.settings.notify_mode, NotifyMode::OnChange);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(Cli::try_parse_from(["campusq", "--poll-interval", "0s"]).is_err());
    }

    #[test]
    fn create_admin_takes_credentials() {
        let cli = Cli::try_parse_from([
            "campusq",
            "create-admin",
            "--email",
            "admin@campus.edu",
            "--password",
            "password123",
        ])
        .unwrap();

        match cli.command {
            Some(Command::CreateAdmin { email, password }) => {
                assert_eq!(email, "admin@campus.edu");
                assert_eq!(password, "password123");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
