use std::sync::Arc;

use predbridge_channel::{Channel, ChannelError};
use predbridge_protocol::{
    decode_message, encode_response, CommandKind, Message, ParameterKind, PredictionContextKind,
    PredictionTarget, Request, Response, SetParam,
};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SessionError};
use crate::params::{LogLevel, ParameterStore};
use crate::predictor::PredictorFactory;
use crate::rank::rank;
use crate::registry::{PredictorRegistry, ReconfigureReport};
use crate::signal::ShutdownSignal;

/// Applies log settings changed by the host to the live subscriber.
pub trait LogControl: Send + Sync {
    fn apply(&self, enabled: bool, level: LogLevel);
}

/// Outcome of handling one incoming text unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub response: Response,
    /// The host asked the bridge to stop.
    pub quit: bool,
}

impl Reply {
    fn respond(response: Response) -> Self {
        Self {
            response,
            quit: false,
        }
    }
}

/// State owned by one host session: parameters and predictors.
pub struct Session {
    params: ParameterStore,
    registry: PredictorRegistry,
    log_control: Option<Arc<dyn LogControl>>,
}

impl Session {
    pub fn new(params: ParameterStore, factory: Arc<dyn PredictorFactory>) -> Self {
        Self {
            params,
            registry: PredictorRegistry::new(factory),
            log_control: None,
        }
    }

    pub fn with_log_control(mut self, control: Arc<dyn LogControl>) -> Self {
        self.log_control = Some(control);
        self
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn registry(&self) -> &PredictorRegistry {
        &self.registry
    }

    /// Run a reconfiguration pass against the current parameters.
    pub fn reconfigure(&mut self) -> ReconfigureReport {
        self.registry.reconfigure(&self.params)
    }

    /// Decode, route and answer one text unit. Never fails: every error
    /// becomes a failure response.
    pub fn handle_text(&mut self, text: &str) -> Reply {
        let message = match decode_message(text) {
            Ok(message) => message,
            Err(err) => {
                let err = SessionError::from(err);
                warn!(error = %err, "rejecting undecodable message");
                return Reply::respond(Response::failure(
                    None,
                    PredictionContextKind::None,
                    err.to_string(),
                ));
            }
        };
        let (command, context) = (message.command, message.context);
        debug!(%command, ?context, payload_len = message.payload.len(), "message received");

        match self.handle(message) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%command, error = %err, "request failed");
                Reply::respond(Response::failure(Some(command), context, err.to_string()))
            }
        }
    }

    fn handle(&mut self, message: Message) -> Result<Reply> {
        let (command, context) = (message.command, message.context);
        let response = match Request::try_from(message)? {
            Request::SetParam(set) => return self.set_param(set, context),
            Request::Predict { target, slot, text } => {
                let prediction = self.registry.predict(slot, &text)?;
                let candidates = match target {
                    PredictionTarget::NextWord => prediction.words,
                    PredictionTarget::NextSentence => prediction.sentences,
                };
                let limit = i64::try_from(self.params.suggestions()).unwrap_or(i64::MAX);
                let ranked = rank(&candidates, limit);
                debug!(%slot, offered = candidates.len(), returned = ranked.len(), "prediction ranked");
                Response::with_candidates(command, context, &ranked)?
            }
            Request::Learn { slot, text } => {
                self.registry.learn(slot, &text)?;
                debug!(%slot, len = text.len(), "text learned");
                Response::ack(command, context)
            }
            Request::ForceQuit => {
                info!("host requested shutdown");
                return Ok(Reply {
                    response: Response::ack(command, context),
                    quit: true,
                });
            }
        };
        Ok(Reply::respond(response))
    }

    fn set_param(&mut self, set: SetParam, context: PredictionContextKind) -> Result<Reply> {
        self.params.set(set.parameter, &set.value)?;
        info!(parameter = %set.parameter, value = %set.value, "parameter set");

        if matches!(
            set.parameter,
            ParameterKind::EnableLogs | ParameterKind::LogLevel
        ) {
            if let Some(control) = &self.log_control {
                control.apply(self.params.enable_logs(), self.params.log_level());
            }
        }

        let report = self.reconfigure();
        let response = if report.is_clean() {
            Response::ack(CommandKind::SetParam, context)
        } else {
            let errors: Vec<String> = report.errors().iter().map(ToString::to_string).collect();
            Response::failure(
                Some(CommandKind::SetParam),
                context,
                format!("parameter applied; {}", errors.join("; ")),
            )
        };
        Ok(Reply::respond(response))
    }
}

/// How a dispatch loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The host sent `FORCE_QUIT`.
    ForceQuit,
    /// The shutdown signal was triggered from elsewhere.
    Shutdown,
}

/// Receive → handle → respond loop over one connected channel.
pub struct Dispatcher {
    channel: Box<dyn Channel>,
    session: Session,
    shutdown: ShutdownSignal,
    signal_on_disconnect: bool,
}

impl Dispatcher {
    pub fn new(channel: Box<dyn Channel>, session: Session, shutdown: ShutdownSignal) -> Self {
        Self {
            channel,
            session,
            shutdown,
            signal_on_disconnect: true,
        }
    }

    /// Leave the shutdown signal alone when the host disconnects, so a
    /// server can go on accepting other hosts.
    pub fn keep_running_on_disconnect(mut self) -> Self {
        self.signal_on_disconnect = false;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Serve messages until `FORCE_QUIT`, the shutdown signal, or a broken
    /// channel.
    pub fn run(&mut self) -> Result<SessionEnd> {
        let peer = self.channel.describe();
        info!(channel = %peer, "session started");

        let end = self.serve();
        match &end {
            Ok(end) => info!(channel = %peer, ?end, "session ended"),
            Err(err) => error!(channel = %peer, error = %err, "session ended"),
        }
        self.channel.disconnect();
        end
    }

    fn serve(&mut self) -> Result<SessionEnd> {
        loop {
            if self.shutdown.is_triggered() {
                return Ok(SessionEnd::Shutdown);
            }

            let text = match self.channel.receive() {
                Ok(text) => text,
                Err(ChannelError::Timeout(_)) => continue,
                Err(ChannelError::Rejected(err)) => {
                    warn!(error = %err, "rejecting unreadable message");
                    let response =
                        Response::failure(None, PredictionContextKind::None, err.to_string());
                    self.respond(&response)?;
                    continue;
                }
                Err(err) => return Err(self.broken(err)),
            };

            let reply = self.session.handle_text(&text);
            if reply.quit {
                // The host may hang up right after FORCE_QUIT; the quit stands.
                self.shutdown.trigger();
                if let Err(err) = self.respond(&reply.response) {
                    warn!(error = %err, "quit acknowledgement not delivered");
                }
                return Ok(SessionEnd::ForceQuit);
            }
            self.respond(&reply.response)?;
        }
    }

    fn respond(&mut self, response: &Response) -> Result<()> {
        let text = match encode_response(response) {
            Ok(text) => text,
            Err(err) => {
                error!(error = %err, "dropping unencodable response");
                return Ok(());
            }
        };
        match self.channel.send(&text) {
            Ok(()) => Ok(()),
            Err(err) if !err.is_fatal() => {
                warn!(error = %err, "response rejected by channel");
                Ok(())
            }
            Err(err) => Err(self.broken(err)),
        }
    }

    fn broken(&mut self, err: ChannelError) -> SessionError {
        if self.signal_on_disconnect {
            self.shutdown.trigger();
        }
        SessionError::ChannelBroken(err)
    }
}
