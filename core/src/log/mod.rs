//! Leveled logging facade with destination fan-out.
//!
//! # Overview
//! Log calls are gated by a minimum level, then turned into a `LogRecord`
//! and queued for a single worker that hands each record to every registered
//! destination in order. The facade formats nothing and writes nothing;
//! destinations decide what a record becomes.
//!
//! ```ignore
//! use courier_core::log::{Level, Logger};
//!
//! let logger = Logger::new("billing", "invoices");
//! logger.add_destination(|record| eprintln!("[{}] {} {}", record.level(), record.source(), record.message()));
//! logger.set_min_level(Level::Debug);
//!
//! let sync = logger.child(None, Some("sync"));
//! sync.info(|| format!("synced {} invoices", 12));
//! courier_core::log_warning!(sync, "retrying batch {}", 3);
//! ```

mod dispatch;
mod level;
mod logger;
mod macros;
mod record;

pub use dispatch::{Destination, DestinationId};
pub use level::{Level, ParseLevelError};
pub use logger::Logger;
pub use record::{CallSite, LogContext, LogMessage, LogRecord, LogSource};
