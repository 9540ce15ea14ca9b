use chrono::{DateTime, Utc};
use regex::Regex;

use crate::record::{LogFormat, LogLevel, LogRecord};

const ERROR_KEYWORDS: [&str; 6] = ["error", "exception", "failed", "fatal", "crash", "panic"];
const WARN_KEYWORDS: [&str; 5] = ["warn", "warning", "deprecated", "slow", "timeout"];
const DEBUG_KEYWORDS: [&str; 3] = ["debug", "trace", "verbose"];

/// Infer a level from message content when the source format has none.
///
/// Keyword classes are checked in fixed precedence: a message matching both
/// an ERROR-class and a WARN-class keyword classifies as ERROR.
pub fn detect_level(message: &str) -> LogLevel {
    let lower = message.to_lowercase();
    if ERROR_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LogLevel::Error
    } else if WARN_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LogLevel::Warn
    } else if DEBUG_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

type Extractor = Box<dyn Fn(&str, DateTime<Utc>) -> Option<LogRecord> + Send + Sync>;

/// Total parser for raw log lines.
///
/// Structured formats are tried in fixed priority (JSON, bracketed, web
/// access log); each extractor either produces a record or declines, in
/// which case the next one is tried. The plain-text fallback guarantees
/// that `parse` always returns a record. New formats are added by
/// appending another extractor to the list.
pub struct LineParser {
    extractors: Vec<Extractor>,
    fallback_source: String,
}

impl LineParser {
    pub fn new(fallback_source: impl Into<String>) -> Self {
        // [LEVEL] YYYY-MM-DD(T| )HH:MM:SS rest-of-message
        let bracketed =
            Regex::new(r"^\[(\w+)\]\s+(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2})\s+(.+)$").unwrap();
        // 192.168.1.1 - - [15/Jan/2024:10:30:00] "GET /"
        let web =
            Regex::new(r#"^(\d+\.\d+\.\d+\.\d+).*\[(.+?)\].*"(GET|POST|PUT|DELETE)"#).unwrap();

        let extractors: Vec<Extractor> = vec![
            Box::new(extract_json),
            Box::new(move |line, now| extract_bracketed(&bracketed, line, now)),
            Box::new(move |line, now| extract_web(&web, line, now)),
        ];

        Self {
            extractors,
            fallback_source: fallback_source.into(),
        }
    }

    /// Parse one non-blank line into a record. Never fails.
    pub fn parse(&self, line: &str, now: DateTime<Utc>) -> LogRecord {
        let trimmed = line.trim();

        for extractor in &self.extractors {
            if let Some(record) = extractor(trimmed, now) {
                return record;
            }
        }

        LogRecord {
            message: trimmed.to_string(),
            level: detect_level(trimmed),
            timestamp: now.to_rfc3339(),
            source: self.fallback_source.clone(),
            format: LogFormat::Plain,
            client_ip: None,
            expires_at: None,
        }
    }
}

/// JSON object with `level` and `message` keys. Decode failures and missing
/// keys decline the match instead of raising.
fn extract_json(line: &str, now: DateTime<Utc>) -> Option<LogRecord> {
    if !line.starts_with('{') {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    let object = value.as_object()?;

    let message = object.get("message")?.as_str()?.trim().to_string();
    if message.is_empty() {
        return None;
    }
    let level_token = object.get("level")?.as_str()?;
    let level = LogLevel::from_token(level_token).unwrap_or_else(|| detect_level(&message));

    let timestamp = object
        .get("timestamp")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| now.to_rfc3339());
    let source = object
        .get("source")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    Some(LogRecord {
        message,
        level,
        timestamp,
        source,
        format: LogFormat::Json,
        client_ip: None,
        expires_at: None,
    })
}

/// `[LEVEL] timestamp message` application logs. The level token is taken
/// literally; a token outside the four known levels declines the match.
fn extract_bracketed(pattern: &Regex, line: &str, _now: DateTime<Utc>) -> Option<LogRecord> {
    let captures = pattern.captures(line)?;
    let level = LogLevel::from_token(&captures[1])?;

    Some(LogRecord {
        message: captures[3].to_string(),
        level,
        timestamp: captures[2].to_string(),
        source: "application".to_string(),
        format: LogFormat::Bracketed,
        client_ip: None,
        expires_at: None,
    })
}

/// Web access logs: dotted-quad client IP, bracketed timestamp, HTTP method.
/// The message keeps the whole original line.
fn extract_web(pattern: &Regex, line: &str, _now: DateTime<Utc>) -> Option<LogRecord> {
    let captures = pattern.captures(line)?;

    Some(LogRecord {
        message: line.to_string(),
        level: LogLevel::Info,
        timestamp: captures[2].to_string(),
        source: "web_server".to_string(),
        format: LogFormat::Web,
        client_ip: Some(captures[1].to_string()),
        expires_at: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> LogRecord {
        LineParser::new("stdin").parse(line, Utc::now())
    }

    #[test]
    fn json_line_parses_with_explicit_level() {
        let record = parse(r#"{"level":"ERROR","message":"disk full"}"#);
        assert_eq!(record.message, "disk full");
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.format, LogFormat::Json);
        assert_eq!(record.source, "unknown");
    }

    #[test]
    fn json_line_takes_timestamp_and_source_when_present() {
        let record = parse(
            r#"{"level":"INFO","message":"started","timestamp":"2024-01-15T08:00:00Z","source":"api"}"#,
        );
        assert_eq!(record.timestamp, "2024-01-15T08:00:00Z");
        assert_eq!(record.source, "api");
    }

    #[test]
    fn json_without_required_keys_falls_through_to_plain() {
        let record = parse(r#"{"msg":"no level or message keys here"}"#);
        assert_eq!(record.format, LogFormat::Plain);
    }

    #[test]
    fn invalid_json_falls_through_to_plain() {
        let record = parse(r#"{"level":"ERROR","message": unterminated"#);
        assert_eq!(record.format, LogFormat::Plain);
        // The heuristic still sees the "error" substring.
        assert_eq!(record.level, LogLevel::Error);
    }

    #[test]
    fn json_with_unknown_level_token_uses_heuristic() {
        let record = parse(r#"{"level":"CRITICAL","message":"payment failed"}"#);
        assert_eq!(record.format, LogFormat::Json);
        assert_eq!(record.level, LogLevel::Error);
    }

    #[test]
    fn bracketed_line_parses() {
        let record = parse("[WARN] 2024-01-15T10:30:00 slow query detected");
        assert_eq!(record.level, LogLevel::Warn);
        assert_eq!(record.timestamp, "2024-01-15T10:30:00");
        assert_eq!(record.message, "slow query detected");
        assert_eq!(record.format, LogFormat::Bracketed);
        assert_eq!(record.source, "application");
    }

    #[test]
    fn bracketed_accepts_space_separated_timestamp() {
        let record = parse("[INFO] 2024-01-15 10:30:00 service started");
        assert_eq!(record.format, LogFormat::Bracketed);
        assert_eq!(record.timestamp, "2024-01-15 10:30:00");
    }

    #[test]
    fn bracketed_with_unknown_level_falls_through() {
        let record = parse("[AUDIT] 2024-01-15T10:30:00 user login");
        assert_eq!(record.format, LogFormat::Plain);
    }

    #[test]
    fn web_access_line_parses() {
        let record = parse(r#"192.168.1.1 - - [15/Jan/2024:10:30:00] "GET /index.html HTTP/1.1" 200"#);
        assert_eq!(record.level, LogLevel::Info);
        assert_eq!(record.format, LogFormat::Web);
        assert_eq!(record.source, "web_server");
        assert_eq!(record.client_ip.as_deref(), Some("192.168.1.1"));
        assert_eq!(record.timestamp, "15/Jan/2024:10:30:00");
        // Message keeps the full original line.
        assert!(record.message.starts_with("192.168.1.1"));
    }

    #[test]
    fn plain_line_uses_heuristic_level() {
        let record = parse("something failed unexpectedly");
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.format, LogFormat::Plain);
        assert_eq!(record.source, "stdin");
    }

    #[test]
    fn fallback_source_is_configurable() {
        let record = LineParser::new("unknown").parse("hello", Utc::now());
        assert_eq!(record.source, "unknown");
    }

    #[test]
    fn error_keywords_take_precedence_over_warn() {
        assert_eq!(detect_level("warning: fatal error detected"), LogLevel::Error);
    }

    #[test]
    fn warn_keywords_take_precedence_over_debug() {
        assert_eq!(detect_level("debug trace shows a timeout"), LogLevel::Warn);
    }

    #[test]
    fn unmatched_messages_default_to_info() {
        assert_eq!(detect_level("user logged in"), LogLevel::Info);
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(detect_level("PANIC in worker thread"), LogLevel::Error);
        assert_eq!(detect_level("Deprecated API usage"), LogLevel::Warn);
        assert_eq!(detect_level("VERBOSE output enabled"), LogLevel::Debug);
    }

    #[test]
    fn parse_is_total_over_arbitrary_input() {
        for line in ["x", "{", "[]", "[X] not a log", "日本語のログ", "   padded   "] {
            let record = parse(line);
            assert!(!record.message.is_empty());
        }
    }
}
