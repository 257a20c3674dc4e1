use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use predbridge_channel::TransportKind;

use crate::exit::{CliError, CliResult, USAGE};
use crate::logging::{LogHandle, LogLevel};
use crate::output::OutputFormat;

pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bridge between a host and the predictors.
    Serve(ServeArgs),
    /// Act as a host: send messages to a listening bridge and print replies.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(
    command: Command,
    format: OutputFormat,
    logs: LogHandle,
    log_level: LogLevel,
) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, logs, log_level),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Pipe socket path, or `host:port` for the socket transport.
    #[arg(env = "PREDBRIDGE_ENDPOINT")]
    pub endpoint: String,
    /// Channel transport.
    #[arg(long, short = 't', default_value = "pipe", env = "PREDBRIDGE_TRANSPORT")]
    pub transport: TransportKind,
    /// Bind the endpoint and wait for hosts instead of connecting to one.
    #[arg(long, env = "PREDBRIDGE_LISTEN")]
    pub listen: bool,
    /// Bound on one blocking receive (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms", env = "PREDBRIDGE_RECEIVE_TIMEOUT")]
    pub receive_timeout: String,
    /// Connection attempts before giving up (client role).
    #[arg(long, default_value_t = 5, env = "PREDBRIDGE_CONNECT_ATTEMPTS")]
    pub connect_attempts: u32,
    /// Initial number of suggestions per prediction.
    #[arg(long, env = "PREDBRIDGE_SUGGESTIONS")]
    pub suggestions: Option<usize>,
    /// Initial model root directory.
    #[arg(long, value_name = "DIR", env = "PREDBRIDGE_PATH")]
    pub path: Option<PathBuf>,
    /// Initial static model directory.
    #[arg(long, value_name = "DIR", env = "PREDBRIDGE_PATH_STATIC")]
    pub path_static: Option<PathBuf>,
    /// Initial personalized model directory.
    #[arg(long, value_name = "DIR", env = "PREDBRIDGE_PATH_PERSONALIZED")]
    pub path_personalized: Option<PathBuf>,
    /// Initial log directory reported to the host.
    #[arg(long, value_name = "DIR", env = "PREDBRIDGE_PATH_LOG")]
    pub path_log: Option<PathBuf>,
    /// Initialize predictors before the first message arrives.
    #[arg(long, env = "PREDBRIDGE_PRELOAD")]
    pub preload: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Pipe socket path, or `host:port` for the socket transport.
    #[arg(env = "PREDBRIDGE_ENDPOINT")]
    pub endpoint: String,
    /// Channel transport.
    #[arg(long, short = 't', default_value = "pipe", env = "PREDBRIDGE_TRANSPORT")]
    pub transport: TransportKind,
    /// Set a parameter (NAME=VALUE, VALUE parsed as JSON when possible). Sent first.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,
    /// Raw message envelope. Sent after --set.
    #[arg(long = "message", short = 'm', value_name = "JSON")]
    pub messages: Vec<String>,
    /// Build one message with this MessageType. Sent after --message.
    #[arg(long, value_name = "COMMAND")]
    pub command: Option<String>,
    /// PredictionType for --command.
    #[arg(long, value_name = "TYPE", requires = "command")]
    pub context: Option<String>,
    /// Data for --command.
    #[arg(long, requires = "command")]
    pub data: Option<String>,
    /// Finish with FORCE_QUIT.
    #[arg(long)]
    pub quit: bool,
    /// Maximum wait for each reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration(" ").unwrap_err().code, USAGE);
    }
}
