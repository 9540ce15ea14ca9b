use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use uuid::Uuid;

/// Severity of a normalized log record.
///
/// Every record carries exactly one of these four levels, either taken
/// verbatim from a structured source format or inferred by the keyword
/// heuristic in [`crate::parser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Normalize an explicit level token from a structured source format.
    ///
    /// Returns `None` for tokens that do not map onto the four known levels,
    /// so callers can treat an unrecognized token as a failed match rather
    /// than guessing.
    pub fn from_token(token: &str) -> Option<LogLevel> {
        match token.to_ascii_uppercase().as_str() {
            "ERROR" => Some(LogLevel::Error),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which parser branch produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Bracketed,
    Web,
    Plain,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Bracketed => "bracketed",
            LogFormat::Web => "web",
            LogFormat::Plain => "plain",
        }
    }
}

/// One ingested log line after normalization.
///
/// `timestamp` is carried as the source-provided string when a structured
/// format supplied one (bracketed and web timestamps are not always RFC 3339
/// with an offset), and as the RFC 3339 ingestion time otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub message: String,
    pub level: LogLevel,
    pub timestamp: String,
    pub source: String,
    pub format: LogFormat,
    pub client_ip: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LogRecord {
    /// Build the payload stored alongside the vector.
    pub fn payload(
        &self,
        processed_at: DateTime<Utc>,
        batch_size: usize,
        ttl: Option<Duration>,
    ) -> Value {
        let mut payload = Map::new();
        payload.insert("message".to_string(), json!(self.message));
        payload.insert("level".to_string(), json!(self.level.as_str()));
        payload.insert("timestamp".to_string(), json!(self.timestamp));
        payload.insert("source".to_string(), json!(self.source));
        payload.insert("format".to_string(), json!(self.format.as_str()));
        payload.insert("processed_at".to_string(), json!(processed_at.to_rfc3339()));
        payload.insert("batch_size".to_string(), json!(batch_size));

        if let Some(client_ip) = &self.client_ip {
            payload.insert("client_ip".to_string(), json!(client_ip));
        }

        if let Some(expires_at) = self.expires_at {
            payload.insert("expires_at".to_string(), json!(expires_at.to_rfc3339()));
            if let Some(ttl) = ttl {
                payload.insert(
                    "ttl".to_string(),
                    json!(humantime::format_duration(ttl).to_string()),
                );
            }
        }

        Value::Object(payload)
    }
}

/// What caused a batch to be cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The append that crossed the size threshold.
    Size,
    /// No append within the idle window.
    Idle,
    /// End of stream or interrupt; final drain.
    Shutdown,
}

impl FlushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushTrigger::Size => "size",
            FlushTrigger::Idle => "idle",
            FlushTrigger::Shutdown => "shutdown",
        }
    }
}

/// An immutable sequence of records drained from the batch buffer,
/// handed to the submitter for embedding and upsert.
#[derive(Debug, Clone)]
pub struct Batch {
    pub batch_id: Uuid,
    pub records: Vec<LogRecord>,
    pub trigger: FlushTrigger,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(records: Vec<LogRecord>, trigger: FlushTrigger) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            records,
            trigger,
            created_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
