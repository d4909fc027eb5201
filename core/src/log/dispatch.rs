//! Serial delivery of log records to destinations.
//!
//! One worker thread drains an unbounded channel, so records reach
//! destinations in the order they were queued and log calls never wait for
//! destination work. The worker exits once every sender is gone and the
//! channel is drained. A destination that panics loses only the record it
//! panicked on; the worker and every other destination keep running.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Sender};

use super::record::LogRecord;

/// Callback receiving every record that passes the level gate.
pub type Destination = Arc<dyn Fn(&LogRecord) + Send + Sync>;

/// Identifies a registered destination for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestinationId(pub(crate) u64);

pub(crate) type DestinationList = Arc<[(DestinationId, Destination)]>;

enum Job {
    Deliver {
        record: LogRecord,
        destinations: DestinationList,
    },
    Flush(Sender<()>),
}

pub(crate) struct DispatchQueue {
    sender: Option<Sender<Job>>,
}

impl DispatchQueue {
    pub(crate) fn start() -> Self {
        let (sender, receiver) = unbounded::<Job>();
        let spawned = std::thread::Builder::new()
            .name("courier-log".to_string())
            .spawn(move || {
                for job in receiver {
                    match job {
                        Job::Deliver {
                            record,
                            destinations,
                        } => deliver(&record, &destinations),
                        Job::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            });

        match spawned {
            Ok(_) => Self {
                sender: Some(sender),
            },
            Err(e) => {
                tracing::warn!(error = %e, "log dispatch thread unavailable, delivering inline");
                Self { sender: None }
            }
        }
    }

    pub(crate) fn submit(&self, record: LogRecord, destinations: DestinationList) {
        match &self.sender {
            Some(sender) => {
                if let Err(crossbeam_channel::SendError(job)) = sender.send(Job::Deliver {
                    record,
                    destinations,
                }) {
                    tracing::warn!("log dispatch thread gone, delivering inline");
                    if let Job::Deliver {
                        record,
                        destinations,
                    } = job
                    {
                        deliver(&record, &destinations);
                    }
                }
            }
            None => deliver(&record, &destinations),
        }
    }

    /// Block until every record submitted before this call was delivered.
    pub(crate) fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        if sender.send(Job::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

fn deliver(record: &LogRecord, destinations: &DestinationList) {
    for (id, destination) in destinations.iter() {
        if catch_unwind(AssertUnwindSafe(|| destination(record))).is_err() {
            tracing::error!(destination = id.0, level = %record.level(), "log destination panicked");
        }
    }
}
