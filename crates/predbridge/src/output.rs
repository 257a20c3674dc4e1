use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use predbridge_protocol::{Candidate, Response, Status};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    command: Option<&'static str>,
    context: &'a predbridge_protocol::PredictionContextKind,
    status: Status,
    error: Option<&'a str>,
    candidates: Vec<Candidate>,
    endpoint: &'a str,
    timestamp: String,
}

/// Print one host-side view of a bridge response.
pub fn print_response(response: &Response, wire: &str, endpoint: &str, format: OutputFormat) {
    let candidates = response.candidates().unwrap_or_default();
    let command = response.command.map(|command| command.as_str());
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                command,
                context: &response.context,
                status: response.status,
                error: response.error.as_deref(),
                candidates,
                endpoint,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            if candidates.is_empty() {
                table
                    .set_header(vec!["COMMAND", "STATUS", "ERROR"])
                    .add_row(vec![
                        command.unwrap_or("-").to_string(),
                        status_name(response.status).to_string(),
                        response.error.clone().unwrap_or_default(),
                    ]);
            } else {
                table.set_header(vec!["RANK", "TEXT", "SCORE"]);
                for (rank, candidate) in candidates.iter().enumerate() {
                    table.add_row(vec![
                        (rank + 1).to_string(),
                        candidate.text.clone(),
                        format!("{:.4}", candidate.score),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
            println!(
                "command={} status={} candidates=[{}]{}",
                command.unwrap_or("-"),
                status_name(response.status),
                texts.join(", "),
                response
                    .error
                    .as_deref()
                    .map(|err| format!(" error={err}"))
                    .unwrap_or_default()
            );
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            let _ = writeln!(out, "{wire}");
            let _ = out.flush();
        }
    }
}

fn status_name(status: Status) -> &'static str {
    match status {
        Status::Success => "SUCCESS",
        Status::Failure => "FAILURE",
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
