use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use predbridge::memory::MemoryPredictorFactory;
use predbridge_channel::{
    open_channel, ChannelConfig, ChannelListener, RetryPolicy, Role, TransportKind,
};
use predbridge_protocol::ParameterKind;
use predbridge_session::{
    Dispatcher, LogControl, ParameterStore, PredictorFactory, Session, SessionEnd, SessionError,
    ShutdownSignal,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{channel_error, session_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::logging::{LogHandle, LogLevel};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: ServeArgs, logs: LogHandle, log_level: LogLevel) -> CliResult<i32> {
    let params = initial_params(&args, log_level)?;
    let config = channel_config(&args)?;

    let shutdown = ShutdownSignal::new();
    install_ctrlc_handler(shutdown.clone())?;

    let bridge = Bridge {
        params,
        factory: Arc::new(MemoryPredictorFactory),
        logs: Arc::new(logs),
        preload: args.preload,
    };

    if args.listen {
        serve_hosts(config, &bridge, &shutdown)
    } else {
        serve_one(config, &bridge, &shutdown)
    }
}

/// Shared ingredients for every session this process runs.
struct Bridge {
    params: ParameterStore,
    factory: Arc<dyn PredictorFactory>,
    logs: Arc<dyn LogControl>,
    preload: bool,
}

impl Bridge {
    fn session(&self) -> Session {
        let mut session = Session::new(self.params.clone(), Arc::clone(&self.factory))
            .with_log_control(Arc::clone(&self.logs));
        if self.preload {
            let report = session.reconfigure();
            for (slot, reason) in report.failures() {
                warn!(%slot, %reason, "predictor preload failed");
            }
        }
        session
    }
}

/// Client role: connect to the host's endpoint and serve that one session.
fn serve_one(config: ChannelConfig, bridge: &Bridge, shutdown: &ShutdownSignal) -> CliResult<i32> {
    let endpoint = config.endpoint.clone();
    let mut channel = open_channel(config).map_err(|err| channel_error("open failed", err))?;
    channel
        .connect()
        .map_err(|err| channel_error(&format!("connect to {endpoint} failed"), err))?;

    let mut dispatcher = Dispatcher::new(channel, bridge.session(), shutdown.clone());
    match dispatcher.run() {
        Ok(_) => Ok(SUCCESS),
        Err(err) => Err(session_error("session failed", err)),
    }
}

/// Server role: accept hosts until shutdown. Pipe hosts are served one at a
/// time; socket hosts each get their own thread.
fn serve_hosts(
    config: ChannelConfig,
    bridge: &Bridge,
    shutdown: &ShutdownSignal,
) -> CliResult<i32> {
    let transport = config.transport;
    let listener = ChannelListener::bind(config).map_err(|err| channel_error("bind failed", err))?;
    info!(endpoint = %listener.local_endpoint(), %transport, "waiting for hosts");

    let mut workers = Vec::new();
    while !shutdown.is_triggered() {
        let channel = match listener.poll_accept() {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
                continue;
            }
            Err(err) => return Err(channel_error("accept failed", err)),
        };

        let mut dispatcher = Dispatcher::new(channel, bridge.session(), shutdown.clone())
            .keep_running_on_disconnect();
        match transport {
            TransportKind::Pipe => log_session_end(dispatcher.run()),
            TransportKind::Socket => {
                workers.push(thread::spawn(move || log_session_end(dispatcher.run())));
            }
        }
        workers.retain(|worker| !worker.is_finished());
    }

    for worker in workers {
        let _ = worker.join();
    }
    info!("bridge stopped");
    Ok(SUCCESS)
}

fn log_session_end(result: Result<SessionEnd, SessionError>) {
    if let Err(err) = result {
        warn!(error = %err, "host session ended");
    }
}

fn channel_config(args: &ServeArgs) -> CliResult<ChannelConfig> {
    let receive_timeout = parse_duration(&args.receive_timeout)?;
    let config = match args.transport {
        TransportKind::Pipe => ChannelConfig::pipe(args.endpoint.clone()),
        TransportKind::Socket => ChannelConfig::socket(args.endpoint.clone()),
    };
    let role = if args.listen {
        Role::Server
    } else {
        Role::Client
    };
    Ok(config
        .with_role(role)
        .with_receive_timeout(receive_timeout)
        .with_retry(RetryPolicy {
            attempts: args.connect_attempts,
            ..RetryPolicy::default()
        }))
}

fn initial_params(args: &ServeArgs, log_level: LogLevel) -> CliResult<ParameterStore> {
    let mut params = ParameterStore::new();
    let level = predbridge_session::LogLevel::from(log_level);
    let mut initial = vec![(ParameterKind::LogLevel, Value::from(level.as_str()))];
    if let Some(count) = args.suggestions {
        initial.push((ParameterKind::Suggestions, Value::from(count)));
    }
    let paths = [
        (ParameterKind::Path, &args.path),
        (ParameterKind::PathStatic, &args.path_static),
        (ParameterKind::PathPersonalized, &args.path_personalized),
        (ParameterKind::PathLog, &args.path_log),
    ];
    for (kind, path) in paths {
        if let Some(path) = path.as_deref() {
            initial.push((kind, path_value(path)));
        }
    }

    for (kind, value) in initial {
        params
            .set(kind, &value)
            .map_err(|err| CliError::new(USAGE, err.to_string()))?;
    }
    Ok(params)
}

fn path_value(path: &Path) -> Value {
    Value::from(path.display().to_string())
}

fn install_ctrlc_handler(shutdown: ShutdownSignal) -> CliResult<()> {
    ctrlc::set_handler(move || {
        shutdown.trigger();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
