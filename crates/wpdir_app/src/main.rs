mod platform;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use wpdir_core::PollIntervals;
use wpdir_engine::{ClientConfig, DEFAULT_BASE_URL};
use wpdir_logging::{wpdir_info, LogDestination};

/// Terminal client for WPdirectory search jobs.
#[derive(Parser, Debug)]
#[command(name = "wpdir", version, about)]
struct Cli {
    /// Address of the WPdirectory server.
    #[arg(long, env = "WPDIR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "WPDIR_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,

    /// Write logs to this file instead of the terminal.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Also log to the terminal when writing a log file.
    #[arg(long, requires = "log_file")]
    log_to_terminal: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Disable syntax highlighting in file viewers.
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow a search job until it finishes, then browse its results.
    Watch { job_id: String },
    /// List the most recent search jobs.
    Recent {
        #[arg(default_value_t = 10)]
        count: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let destination = log_destination(cli.log_file.clone(), cli.log_to_terminal);
    wpdir_logging::initialize(destination, cli.log_level.into());

    let mut config = ClientConfig::with_base_url(&cli.base_url)
        .with_context(|| format!("invalid base url `{}`", cli.base_url))?;
    config.request_timeout = Duration::from_millis(cli.timeout_ms);
    wpdir_info!(
        "wpdir {} against {}",
        env!("CARGO_PKG_VERSION"),
        config.base_url
    );

    match cli.command {
        Command::Watch { job_id } => {
            let highlight = !cli.no_color && std::io::stdout().is_terminal();
            platform::run_watch(config, PollIntervals::default(), job_id, highlight)
        }
        Command::Recent { count } => platform::run_recent(config, count),
    }
}

fn log_destination(log_file: Option<PathBuf>, to_terminal: bool) -> LogDestination {
    match log_file {
        Some(path) if to_terminal => LogDestination::Both(path),
        Some(path) => LogDestination::File(path),
        None => LogDestination::Terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_flags_pick_destination() {
        let args = ["wpdir", "--log-file", "wpdir.log", "--log-to-terminal", "recent"];
        let cli = Cli::try_parse_from(args).expect("valid flags");
        assert_eq!(
            log_destination(cli.log_file, cli.log_to_terminal),
            LogDestination::Both(PathBuf::from("wpdir.log"))
        );
        assert_eq!(
            log_destination(Some(PathBuf::from("wpdir.log")), false),
            LogDestination::File(PathBuf::from("wpdir.log"))
        );
        assert_eq!(log_destination(None, false), LogDestination::Terminal);
    }

    #[test]
    fn terminal_copy_needs_a_log_file() {
        assert!(Cli::try_parse_from(["wpdir", "--log-to-terminal", "recent"]).is_err());
    }
}
