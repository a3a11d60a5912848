//! Run an ingest on its own thread and stream records over a bounded channel.

use std::io::Read;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Iter, Receiver, Sender};
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::config::{ConfigError, IngestConfig};
use crate::ingest::core::StreamingRecordIngestor;
use crate::ingest::types::{FieldRecord, RecordSink};
use crate::telemetry::TelemetrySnapshot;
use crate::types::IngestError;

/// One element of a tracked member.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEvent {
    pub field: String,
    pub record: FieldRecord,
}

/// Forwards records into the channel; a closed channel cancels the worker's
/// own token.
struct ChannelSink {
    tx: Sender<FieldEvent>,
    cancel: CancellationToken,
}

impl RecordSink for ChannelSink {
    fn on_record(&mut self, field: &str, record: FieldRecord) {
        let event = FieldEvent { field: field.to_string(), record };
        if self.tx.send(event).is_err() && !self.cancel.is_cancelled() {
            debug!("event receiver dropped, cancelling ingest");
            self.cancel.cancel();
        }
    }
}

pub struct IngestHandle {
    events: Receiver<FieldEvent>,
    /// Child of the caller's token; stopping the worker never cancels the caller's.
    cancel: CancellationToken,
    worker: JoinHandle<Result<TelemetrySnapshot, IngestError>>,
}

impl IngestHandle {
    pub fn events(&self) -> &Receiver<FieldEvent> {
        &self.events
    }

    /// Blocking iterator over events; ends when the worker is done.
    pub fn iter(&self) -> Iter<'_, FieldEvent> {
        self.events.iter()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drop the receiver and wait for the worker. Events not yet received are
    /// discarded; a worker still producing observes the closed channel and
    /// stops with `Cancelled`.
    pub fn join(self) -> Result<TelemetrySnapshot, IngestError> {
        let IngestHandle { events, worker, .. } = self;
        drop(events);
        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Start ingesting `stream` on a new thread. Records of the members listed in
/// `config.fields` arrive on the handle's bounded channel, so a slow consumer
/// holds back the reader instead of growing a queue.
///
/// The worker stops when `cancel` is cancelled, when `IngestHandle::cancel`
/// is called, or when the receiver is dropped. Only the first of these
/// touches `cancel` itself.
pub fn spawn_ingest<R>(
    stream: R,
    config: IngestConfig,
    cancel: CancellationToken,
) -> Result<IngestHandle, ConfigError>
where
    R: Read + Send + 'static,
{
    let ingestor = StreamingRecordIngestor::new(config)?;
    let (tx, rx) = bounded(ingestor.config().channel_capacity);

    let cancel = cancel.child();
    let worker_cancel = cancel.clone();
    let worker = thread::spawn(move || {
        let mut sink = ChannelSink { tx, cancel: worker_cancel.clone() };
        ingestor.ingest_with(stream, &mut sink, &worker_cancel)
    });

    Ok(IngestHandle { events: rx, cancel, worker })
}
