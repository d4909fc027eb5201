//! Log records and the sources they are tagged with.

use std::any::Any;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::Level;

/// Payload of a log record.
#[derive(Debug, Clone, PartialEq)]
pub enum LogMessage {
    Text(String),
    Structured(serde_json::Value),
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogMessage::Text(text) => f.write_str(text),
            LogMessage::Structured(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for LogMessage {
    fn from(text: String) -> Self {
        LogMessage::Text(text)
    }
}

impl From<&str> for LogMessage {
    fn from(text: &str) -> Self {
        LogMessage::Text(text.to_string())
    }
}

impl From<serde_json::Value> for LogMessage {
    fn from(value: serde_json::Value) -> Self {
        LogMessage::Structured(value)
    }
}

/// Opaque value attached to a source, recovered with `downcast_ref`.
#[derive(Clone)]
pub struct LogContext(Arc<dyn Any + Send + Sync>);

impl LogContext {
    pub fn new<C: Any + Send + Sync>(context: C) -> Self {
        Self(Arc::new(context))
    }

    pub fn downcast_ref<C: Any>(&self) -> Option<&C> {
        self.0.downcast_ref::<C>()
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogContext(..)")
    }
}

/// Where a record came from: subsystem, category and an optional context.
#[derive(Debug, Clone)]
pub struct LogSource {
    subsystem: Arc<str>,
    category: Arc<str>,
    context: Option<LogContext>,
}

impl LogSource {
    pub fn new(subsystem: &str, category: &str) -> Self {
        Self {
            subsystem: Arc::from(subsystem),
            category: Arc::from(category),
            context: None,
        }
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn context(&self) -> Option<&LogContext> {
        self.context.as_ref()
    }

    /// Derive a source overriding subsystem and/or category.
    ///
    /// The context is inherited.
    pub fn derive(&self, subsystem: Option<&str>, category: Option<&str>) -> Self {
        Self {
            subsystem: subsystem.map(Arc::from).unwrap_or_else(|| self.subsystem.clone()),
            category: category.map(Arc::from).unwrap_or_else(|| self.category.clone()),
            context: self.context.clone(),
        }
    }

    pub fn with_context(&self, context: LogContext) -> Self {
        Self {
            context: Some(context),
            ..self.clone()
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subsystem, self.category)
    }
}

/// Where in the code a log call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
    /// Enclosing module path when the call came through a macro.
    pub function: Option<&'static str>,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32, column: u32, function: Option<&'static str>) -> Self {
        Self {
            file,
            line,
            column,
            function,
        }
    }

    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line(), location.column(), None)
    }
}

/// A single log event as delivered to destinations.
#[derive(Debug, Clone)]
pub struct LogRecord {
    level: Level,
    message: LogMessage,
    source: LogSource,
    call_site: CallSite,
    timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub(crate) fn new(level: Level, message: LogMessage, source: LogSource, call_site: CallSite) -> Self {
        Self {
            level,
            message,
            source,
            call_site,
            timestamp: Utc::now(),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &LogMessage {
        &self.message
    }

    pub fn source(&self) -> &LogSource {
        &self.source
    }

    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
