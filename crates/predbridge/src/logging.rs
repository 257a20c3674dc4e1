use clap::ValueEnum;
use predbridge_session::LogControl;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Registry};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        session_filter(self.into())
    }
}

impl From<LogLevel> for predbridge_session::LogLevel {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

fn session_filter(level: predbridge_session::LogLevel) -> LevelFilter {
    match level {
        predbridge_session::LogLevel::Error => LevelFilter::ERROR,
        predbridge_session::LogLevel::Warn => LevelFilter::WARN,
        predbridge_session::LogLevel::Info => LevelFilter::INFO,
        predbridge_session::LogLevel::Debug => LevelFilter::DEBUG,
        predbridge_session::LogLevel::Trace => LevelFilter::TRACE,
    }
}

/// Handle onto the live subscriber's level filter.
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    pub fn set_filter(&self, filter: LevelFilter) {
        if let Err(err) = self.filter.modify(|current| *current = filter) {
            eprintln!("warning: failed to update log level: {err}");
        }
    }
}

/// Every session shares this handle, so a host's change applies process-wide.
impl LogControl for LogHandle {
    fn apply(&self, enabled: bool, level: predbridge_session::LogLevel) {
        let filter = if enabled {
            session_filter(level)
        } else {
            LevelFilter::OFF
        };
        self.set_filter(filter);
        tracing::info!(%filter, "log settings changed by host");
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel) -> LogHandle {
    let (filter, handle) = reload::Layer::new(level.as_filter());
    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = registry.with(layer).try_init();
        }
        LogFormat::Json => {
            let _ = registry.with(layer.json()).try_init();
        }
    }
    LogHandle { filter: handle }
}
