use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use predbridge_protocol::ParameterKind;
use serde_json::Value;

/// Default number of suggestions returned per prediction.
pub const DEFAULT_SUGGESTIONS: usize = 5;

/// A parameter value that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value} for {parameter}: {reason}")]
pub struct ParamError {
    pub parameter: ParameterKind,
    pub value: String,
    pub reason: &'static str,
}

impl ParamError {
    fn new(parameter: ParameterKind, value: &Value, reason: &'static str) -> Self {
        Self {
            parameter,
            value: value.to_string(),
            reason,
        }
    }
}

/// Verbosity requested by the host for predbridge's own logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Numeric levels as used by hosts with a 10/20/30/40/50 scale.
    fn from_number(level: u64) -> Option<Self> {
        match level {
            0..=9 => Some(Self::Trace),
            10..=19 => Some(Self::Debug),
            20..=29 => Some(Self::Info),
            30..=39 => Some(Self::Warn),
            40..=50 => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "critical" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => other
                .parse::<u64>()
                .ok()
                .and_then(Self::from_number)
                .ok_or_else(|| format!("unknown log level '{s}'")),
        }
    }
}

/// Mutable runtime configuration of one session.
///
/// Setters validate before mutating; a rejected value leaves the previous one
/// in place. Nothing here touches predictors: changes reach them only through
/// a registry reconfiguration pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    path: Option<PathBuf>,
    path_static: Option<PathBuf>,
    path_personalized: Option<PathBuf>,
    path_log: Option<PathBuf>,
    enable_logs: bool,
    suggestions: usize,
    test_gen_sentence_pred: bool,
    retrieve_aac: bool,
    log_level: LogLevel,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            path: None,
            path_static: None,
            path_personalized: None,
            path_log: None,
            enable_logs: true,
            suggestions: DEFAULT_SUGGESTIONS,
            test_gen_sentence_pred: false,
            retrieve_aac: false,
            log_level: LogLevel::default(),
        }
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `value` for `parameter` and store it.
    pub fn set(&mut self, parameter: ParameterKind, value: &Value) -> Result<(), ParamError> {
        match parameter {
            ParameterKind::Path => self.path = Some(coerce_path(parameter, value)?),
            ParameterKind::PathStatic => self.path_static = Some(coerce_path(parameter, value)?),
            ParameterKind::PathPersonalized => {
                self.path_personalized = Some(coerce_path(parameter, value)?)
            }
            ParameterKind::PathLog => self.path_log = Some(coerce_path(parameter, value)?),
            ParameterKind::EnableLogs => self.enable_logs = coerce_bool(parameter, value)?,
            ParameterKind::Suggestions => self.suggestions = coerce_count(parameter, value)?,
            ParameterKind::TestGenSentencePred => {
                self.test_gen_sentence_pred = coerce_bool(parameter, value)?
            }
            ParameterKind::RetrieveAac => self.retrieve_aac = coerce_bool(parameter, value)?,
            ParameterKind::LogLevel => self.log_level = coerce_log_level(parameter, value)?,
        }
        Ok(())
    }

    /// Current value of `parameter` as JSON (`null` for unset paths).
    pub fn get(&self, parameter: ParameterKind) -> Value {
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map_or(Value::Null, |p| Value::from(p.display().to_string()))
        };
        match parameter {
            ParameterKind::Path => path(&self.path),
            ParameterKind::PathStatic => path(&self.path_static),
            ParameterKind::PathPersonalized => path(&self.path_personalized),
            ParameterKind::PathLog => path(&self.path_log),
            ParameterKind::EnableLogs => Value::from(self.enable_logs),
            ParameterKind::Suggestions => Value::from(self.suggestions),
            ParameterKind::TestGenSentencePred => Value::from(self.test_gen_sentence_pred),
            ParameterKind::RetrieveAac => Value::from(self.retrieve_aac),
            ParameterKind::LogLevel => Value::from(self.log_level.as_str()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn path_static(&self) -> Option<&Path> {
        self.path_static.as_deref()
    }

    pub fn path_personalized(&self) -> Option<&Path> {
        self.path_personalized.as_deref()
    }

    pub fn path_log(&self) -> Option<&Path> {
        self.path_log.as_deref()
    }

    pub fn enable_logs(&self) -> bool {
        self.enable_logs
    }

    pub fn suggestions(&self) -> usize {
        self.suggestions
    }

    /// Whether sentence predictors should generate general sentences.
    pub fn test_gen_sentence_pred(&self) -> bool {
        self.test_gen_sentence_pred
    }

    /// Whether sentence predictors may retrieve from the AAC phrase set.
    pub fn retrieve_aac(&self) -> bool {
        self.retrieve_aac
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }
}

fn coerce_path(parameter: ParameterKind, value: &Value) -> Result<PathBuf, ParamError> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Ok(PathBuf::from(text)),
        Value::String(_) => Err(ParamError::new(parameter, value, "path must not be empty")),
        _ => Err(ParamError::new(parameter, value, "expected a path string")),
    }
}

fn coerce_bool(parameter: ParameterKind, value: &Value) -> Result<bool, ParamError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ParamError::new(parameter, value, "expected true or false")),
        },
        _ => Err(ParamError::new(parameter, value, "expected a boolean")),
    }
}

fn coerce_count(parameter: ParameterKind, value: &Value) -> Result<usize, ParamError> {
    let count = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    match count.and_then(|count| usize::try_from(count).ok()) {
        Some(0) => Err(ParamError::new(parameter, value, "must be at least 1")),
        Some(count) => Ok(count),
        None => Err(ParamError::new(parameter, value, "expected a positive integer")),
    }
}

fn coerce_log_level(parameter: ParameterKind, value: &Value) -> Result<LogLevel, ParamError> {
    let parsed = match value {
        Value::String(text) => text.parse().ok(),
        Value::Number(number) => number.as_u64().and_then(LogLevel::from_number),
        _ => None,
    };
    parsed.ok_or_else(|| ParamError::new(parameter, value, "expected a log level"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn suggestions_roundtrip_through_store() {
        let mut store = ParameterStore::new();
        store.set(ParameterKind::Suggestions, &json!(10)).unwrap();
        assert_eq!(store.suggestions(), 10);
        assert_eq!(store.get(ParameterKind::Suggestions), json!(10));
    }

    #[test]
    fn suggestions_coerce_from_string_and_integral_float() {
        let mut store = ParameterStore::new();
        store.set(ParameterKind::Suggestions, &json!("7")).unwrap();
        assert_eq!(store.suggestions(), 7);
        store.set(ParameterKind::Suggestions, &json!(3.0)).unwrap();
        assert_eq!(store.suggestions(), 3);
    }

    #[test]
    fn invalid_suggestions_keep_prior_value() {
        let mut store = ParameterStore::new();
        store.set(ParameterKind::Suggestions, &json!(10)).unwrap();

        for bad in [json!(0), json!(-3), json!(2.5), json!("ten"), json!(true), json!(null)] {
            let err = store.set(ParameterKind::Suggestions, &bad).unwrap_err();
            assert_eq!(err.parameter, ParameterKind::Suggestions);
            assert_eq!(store.suggestions(), 10, "value {bad} must be rejected");
        }
    }

    #[test]
    fn booleans_accept_common_spellings() {
        let mut store = ParameterStore::new();
        store.set(ParameterKind::RetrieveAac, &json!("True")).unwrap();
        assert!(store.retrieve_aac());
        store.set(ParameterKind::RetrieveAac, &json!("0")).unwrap();
        assert!(!store.retrieve_aac());
        store
            .set(ParameterKind::TestGenSentencePred, &json!(true))
            .unwrap();
        assert!(store.test_gen_sentence_pred());

        assert!(store.set(ParameterKind::EnableLogs, &json!("maybe")).is_err());
        assert!(store.set(ParameterKind::EnableLogs, &json!(1)).is_err());
        assert!(store.enable_logs());
    }

    #[test]
    fn paths_must_be_non_empty_strings() {
        let mut store = ParameterStore::new();
        store
            .set(ParameterKind::PathStatic, &json!("/opt/models/static"))
            .unwrap();
        assert_eq!(store.path_static(), Some(Path::new("/opt/models/static")));

        assert!(store.set(ParameterKind::PathStatic, &json!("  ")).is_err());
        assert!(store.set(ParameterKind::PathLog, &json!(42)).is_err());
        assert_eq!(store.path_static(), Some(Path::new("/opt/models/static")));
        assert_eq!(store.get(ParameterKind::PathLog), Value::Null);
    }

    #[test]
    fn log_level_accepts_names_and_numbers() {
        let mut store = ParameterStore::new();
        store.set(ParameterKind::LogLevel, &json!("DEBUG")).unwrap();
        assert_eq!(store.log_level(), LogLevel::Debug);
        store.set(ParameterKind::LogLevel, &json!(30)).unwrap();
        assert_eq!(store.log_level(), LogLevel::Warn);
        store.set(ParameterKind::LogLevel, &json!("50")).unwrap();
        assert_eq!(store.log_level(), LogLevel::Error);

        assert!(store.set(ParameterKind::LogLevel, &json!("loud")).is_err());
        assert!(store.set(ParameterKind::LogLevel, &json!(99)).is_err());
        assert_eq!(store.log_level(), LogLevel::Error);
    }
}
