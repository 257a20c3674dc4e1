mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "predbridge",
    version,
    about = "Bridge between assistive-technology hosts and predictive-text engines"
)]
struct Cli {
    /// Output format for replies printed by `send`.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        global = true,
        env = "PREDBRIDGE_LOG_FORMAT"
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr). Hosts may change it at runtime.
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        env = "PREDBRIDGE_LOG_LEVEL"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    let logs = init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format, logs, cli.log_level);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
