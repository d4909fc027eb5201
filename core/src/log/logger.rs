//! The leveled logger and its named children.
//!
//! # Design
//! A `Logger` is a handle: shared state (`LoggerCore`) plus the source its
//! records are tagged with. Children clone the handle with a derived source,
//! so they gate, assert and dispatch exactly like their parent and see every
//! later change to the parent's level or destinations.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::dispatch::{Destination, DestinationId, DestinationList, DispatchQueue};
use super::record::{CallSite, LogContext, LogMessage, LogRecord, LogSource};
use super::Level;
use crate::config::LoggerConfig;

struct LoggerCore {
    min_level: RwLock<Level>,
    assertions_enabled: AtomicBool,
    destinations: RwLock<DestinationList>,
    next_destination_id: AtomicU64,
    queue: DispatchQueue,
}

/// Leveled logger fanning records out to registered destinations.
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    source: LogSource,
}

impl Logger {
    /// Root logger with the default configuration and the given source.
    pub fn new(subsystem: &str, category: &str) -> Self {
        Self::from_config(&LoggerConfig {
            subsystem: subsystem.to_string(),
            category: category.to_string(),
            ..LoggerConfig::default()
        })
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        let empty: DestinationList = Vec::new().into();
        Self {
            core: Arc::new(LoggerCore {
                min_level: RwLock::new(config.min_level),
                assertions_enabled: AtomicBool::new(config.assertions_enabled),
                destinations: RwLock::new(empty),
                next_destination_id: AtomicU64::new(1),
                queue: DispatchQueue::start(),
            }),
            source: LogSource::new(&config.subsystem, &config.category),
        }
    }

    /// Process-wide logger, created with the default configuration on first use.
    pub fn global() -> &'static Logger {
        static GLOBAL: OnceLock<Logger> = OnceLock::new();
        GLOBAL.get_or_init(|| Logger::from_config(&LoggerConfig::default()))
    }

    pub fn source(&self) -> &LogSource {
        &self.source
    }

    pub fn min_level(&self) -> Level {
        *self.core.min_level.read()
    }

    pub fn set_min_level(&self, level: Level) {
        *self.core.min_level.write() = level;
    }

    /// Whether a call at `level` would pass the gate.
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.min_level()
    }

    pub fn assertions_enabled(&self) -> bool {
        self.core.assertions_enabled.load(Ordering::Acquire)
    }

    pub fn set_assertions_enabled(&self, enabled: bool) {
        self.core.assertions_enabled.store(enabled, Ordering::Release);
    }

    /// Register a destination. Records already queued are not redelivered.
    pub fn add_destination(&self, destination: impl Fn(&LogRecord) + Send + Sync + 'static) -> DestinationId {
        let id = DestinationId(self.core.next_destination_id.fetch_add(1, Ordering::Relaxed));
        let destination: Destination = Arc::new(destination);
        let mut list = self.core.destinations.write();
        let mut updated: Vec<(DestinationId, Destination)> = list.iter().cloned().collect();
        updated.push((id, destination));
        *list = updated.into();
        id
    }

    /// Unregister a destination. Returns whether it was registered.
    pub fn remove_destination(&self, id: DestinationId) -> bool {
        let mut list = self.core.destinations.write();
        if !list.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let updated: Vec<(DestinationId, Destination)> =
            list.iter().filter(|(existing, _)| *existing != id).cloned().collect();
        *list = updated.into();
        true
    }

    pub fn clear_destinations(&self) {
        *self.core.destinations.write() = Vec::new().into();
    }

    pub fn destination_count(&self) -> usize {
        self.core.destinations.read().len()
    }

    /// Child logger overriding subsystem and/or category.
    pub fn child(&self, subsystem: Option<&str>, category: Option<&str>) -> Logger {
        Logger {
            core: self.core.clone(),
            source: self.source.derive(subsystem, category),
        }
    }

    /// Child logger carrying `context` in its source.
    pub fn with_context<C: Any + Send + Sync>(&self, context: C) -> Logger {
        Logger {
            core: self.core.clone(),
            source: self.source.with_context(LogContext::new(context)),
        }
    }

    /// Log through the full pipeline.
    ///
    /// Below the minimum level this returns without calling `message`. When
    /// `assert` is set and assertions are enabled, debug builds panic with
    /// the message before any record is built.
    pub fn log_at<M, F>(&self, level: Level, assert: bool, call_site: CallSite, message: F)
    where
        M: Into<LogMessage>,
        F: FnOnce() -> M,
    {
        if !self.is_enabled(level) {
            return;
        }
        let message = message().into();
        if assert && self.assertions_enabled() {
            debug_assert!(false, "{message}");
        }
        let destinations = self.core.destinations.read().clone();
        if destinations.is_empty() {
            return;
        }
        let record = LogRecord::new(level, message, self.source.clone(), call_site);
        self.core.queue.submit(record, destinations);
    }

    #[track_caller]
    pub fn log<M: Into<LogMessage>>(&self, level: Level, message: impl FnOnce() -> M) {
        self.log_at(level, false, CallSite::caller(), message);
    }

    #[track_caller]
    pub fn trace<M: Into<LogMessage>>(&self, message: impl FnOnce() -> M) {
        self.log_at(Level::Trace, false, CallSite::caller(), message);
    }

    #[track_caller]
    pub fn debug<M: Into<LogMessage>>(&self, message: impl FnOnce() -> M) {
        self.log_at(Level::Debug, false, CallSite::caller(), message);
    }

    #[track_caller]
    pub fn info<M: Into<LogMessage>>(&self, message: impl FnOnce() -> M) {
        self.log_at(Level::Info, false, CallSite::caller(), message);
    }

    #[track_caller]
    pub fn notice<M: Into<LogMessage>>(&self, message: impl FnOnce() -> M) {
        self.log_at(Level::Notice, false, CallSite::caller(), message);
    }

    #[track_caller]
    pub fn warning<M: Into<LogMessage>>(&self, message: impl FnOnce() -> M) {
        self.log_at(Level::Warning, false, CallSite::caller(), message);
    }

    #[track_caller]
    pub fn error<M: Into<LogMessage>>(&self, message: impl FnOnce() -> M) {
        self.log_at(Level::Error, false, CallSite::caller(), message);
    }

    #[track_caller]
    pub fn critical<M: Into<LogMessage>>(&self, message: impl FnOnce() -> M) {
        self.log_at(Level::Critical, false, CallSite::caller(), message);
    }

    /// Log at `level` with the assertion flag set.
    #[track_caller]
    pub fn assertion_failure<M: Into<LogMessage>>(&self, level: Level, message: impl FnOnce() -> M) {
        self.log_at(level, true, CallSite::caller(), message);
    }

    /// Block until every record logged before this call has been delivered.
    ///
    /// Must not be called from inside a destination.
    pub fn flush(&self) {
        self.core.queue.flush();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("source", &self.source)
            .field("min_level", &self.min_level())
            .field("destinations", &self.destination_count())
            .finish()
    }
}
