use std::time::{Duration, Instant};

use predbridge_channel::{open_channel, Channel, ChannelConfig, ChannelError, RetryPolicy};
use predbridge_protocol::{
    decode_message, decode_response, encode_message, CommandKind, Message, ParameterKind,
    PredictionContextKind,
};
use serde_json::Value;
use tracing::debug;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{channel_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let outgoing = build_messages(&args)?;
    if outgoing.is_empty() {
        return Err(CliError::new(
            USAGE,
            "nothing to send: use --set, --message, --command or --quit",
        ));
    }

    let config = match args.transport {
        predbridge_channel::TransportKind::Pipe => ChannelConfig::pipe(args.endpoint.clone()),
        predbridge_channel::TransportKind::Socket => ChannelConfig::socket(args.endpoint.clone()),
    }
    .with_retry(RetryPolicy::none());
    let mut channel = open_channel(config).map_err(|err| channel_error("open failed", err))?;
    channel
        .connect()
        .map_err(|err| channel_error("connect failed", err))?;

    let mut code = SUCCESS;
    for text in outgoing {
        debug!(message = %text, "sending");
        channel
            .send(&text)
            .map_err(|err| channel_error("send failed", err))?;
        let wire = wait_for_response(&mut channel, wait_timeout)
            .map_err(|err| channel_error("receive failed", err))?;
        let response = decode_response(&wire)
            .map_err(|err| CliError::new(DATA_INVALID, format!("invalid reply: {err}")))?;
        print_response(&response, &wire, &args.endpoint, format);
        if !response.is_success() {
            code = FAILURE;
        }
    }
    channel.disconnect();
    Ok(code)
}

/// Encoded messages in send order: `--set`, `--message`, `--command`, `--quit`.
fn build_messages(args: &SendArgs) -> CliResult<Vec<String>> {
    let mut messages = Vec::new();
    for assignment in &args.set {
        messages.push(set_param_message(assignment)?);
    }
    for raw in &args.messages {
        let message = decode_message(raw)
            .map_err(|err| CliError::new(USAGE, format!("--message is not a valid envelope: {err}")))?;
        messages.push(message);
    }
    if let Some(command) = &args.command {
        let command: CommandKind = parse_wire_name(command, "--command")?;
        let context = match &args.context {
            Some(context) => parse_wire_name(context, "--context")?,
            None => PredictionContextKind::None,
        };
        let data = args.data.clone().unwrap_or_default();
        messages.push(Message::new(command, context, data));
    }
    if args.quit {
        messages.push(Message::force_quit());
    }

    messages
        .iter()
        .map(|message| {
            encode_message(message)
                .map_err(|err| CliError::new(DATA_INVALID, format!("encode failed: {err}")))
        })
        .collect()
}

fn set_param_message(assignment: &str) -> CliResult<Message> {
    let (name, value) = assignment
        .split_once('=')
        .ok_or_else(|| CliError::new(USAGE, format!("--set expects NAME=VALUE, got '{assignment}'")))?;
    let parameter: ParameterKind = name
        .trim()
        .to_ascii_uppercase()
        .parse()
        .map_err(|err| CliError::new(USAGE, format!("--set: {err}")))?;
    let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::from(value));
    Ok(Message::set_param(parameter, value))
}

fn parse_wire_name<T: serde::de::DeserializeOwned>(name: &str, flag: &str) -> CliResult<T> {
    serde_json::from_value(Value::from(name.trim().to_ascii_uppercase()))
        .map_err(|_| CliError::new(USAGE, format!("{flag}: unknown value '{name}'")))
}

trait ResponseReceiver {
    fn receive_text(&mut self) -> Result<String, ChannelError>;
}

impl ResponseReceiver for Box<dyn Channel> {
    fn receive_text(&mut self) -> Result<String, ChannelError> {
        self.receive()
    }
}

/// Keep receiving through short channel timeouts until `wait` has elapsed.
fn wait_for_response<R: ResponseReceiver>(
    receiver: &mut R,
    wait: Duration,
) -> Result<String, ChannelError> {
    let start = Instant::now();
    loop {
        match receiver.receive_text() {
            Err(ChannelError::Timeout(_)) if start.elapsed() < wait => continue,
            Err(ChannelError::Timeout(_)) => return Err(ChannelError::Timeout(wait)),
            other => return other,
        }
    }
}
