use crate::app::config::ConfigOverrides;
use clap::{Arg, ArgAction, ArgMatches, Command, builder::BoolishValueParser};
use tracing::Level;

pub const ARG_API_BASE_URL: &str = "api-base-url";
pub const ARG_DEMO: &str = "demo";
pub const ARG_SESSION_FILE: &str = "session-file";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_VERBOSE: &str = "verbose";
pub const ARG_LOG_LEVEL: &str = "log-level";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_BASE_URL)
                .long(ARG_API_BASE_URL)
                .help("Portal API base URL, e.g. https://mcc.edu.in/api")
                .long_help(
                    "Portal API base URL. When unset or left at the relative /api placeholder the client runs against the built-in demo backend.",
                )
                .env("MCC_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_DEMO)
                .long(ARG_DEMO)
                .help("Use the built-in demo backend instead of the portal API")
                .env("MCC_DEMO")
                .global(true)
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long(ARG_SESSION_FILE)
                .help("File holding the persisted admin session")
                .env("MCC_SESSION_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("HTTP request timeout in seconds")
                .env("MCC_HTTP_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_VERBOSE)
                .short('v')
                .long(ARG_VERBOSE)
                .help("Raise log output: -v warn, -vv info, -vvv debug, -vvvv trace")
                .global(true)
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new(ARG_LOG_LEVEL)
                .long(ARG_LOG_LEVEL)
                .help("Log level, overrides -v")
                .env("MCC_LOG_LEVEL")
                .global(true)
                .value_parser(parse_log_level),
        )
}

fn parse_log_level(value: &str) -> Result<Level, String> {
    match value.trim().to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        other => Err(format!(
            "unknown log level '{other}', expected one of: {}",
            LOG_LEVELS.join(", ")
        )),
    }
}

/// Level requested through `--log-level`/`MCC_LOG_LEVEL`, else through `-v`.
/// `None` leaves the default (errors only).
#[must_use]
pub fn log_level(matches: &ArgMatches) -> Option<Level> {
    if let Some(level) = matches.get_one::<Level>(ARG_LOG_LEVEL) {
        return Some(*level);
    }
    match matches.get_count(ARG_VERBOSE) {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Collects the configuration flags; unset values keep their defaults.
#[must_use]
pub fn overrides(matches: &ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        api_base_url: matches.get_one::<String>(ARG_API_BASE_URL).cloned(),
        session_file: matches.get_one::<String>(ARG_SESSION_FILE).cloned(),
        timeout_seconds: matches.get_one::<u64>(ARG_TIMEOUT).copied(),
        demo: matches.get_flag(ARG_DEMO),
    }
}
