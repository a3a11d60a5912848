//! The ingest loop: one pass over a document, routing tracked array
//! elements to a sink and skipping everything else.

use std::io::Read;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::cancel::CancellationToken;
use crate::config::{ConfigError, IngestConfig};
use crate::constants::DEFAULT_FIELDS;
use crate::ingest::types::{FieldCallbacks, FieldRecord, ParseResult, RecordSink};
use crate::json::{name_limit, RecordReader, ValueType};
use crate::telemetry::{IngestCounters, Stage, TelemetrySnapshot, TelemetryTimer};
use crate::types::IngestError;

/// Levels the reader needs above the configured limit: the top-level object
/// and the tracked array itself.
const ENVELOPING_LEVELS: usize = 2;

#[derive(Debug, Clone)]
pub struct StreamingRecordIngestor {
    config: IngestConfig,
}

impl StreamingRecordIngestor {
    pub fn new(config: IngestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Deliver every element of `"name"` to `on_name` and every element of
    /// `"gender"` to `on_gender`, in source order. Other members are skipped.
    ///
    /// The stream is consumed and dropped before this returns, on every path.
    pub fn ingest<R, N, G>(
        &self,
        stream: R,
        on_name: N,
        on_gender: G,
        cancel: &CancellationToken,
    ) -> Result<TelemetrySnapshot, IngestError>
    where
        R: Read,
        N: FnMut(FieldRecord),
        G: FnMut(FieldRecord),
    {
        let fields: Vec<String> = DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect();
        let mut sink = FieldCallbacks { on_name, on_gender };
        self.run(stream, &fields, &mut sink, cancel)
    }

    /// Deliver the elements of every member listed in `IngestConfig::fields`.
    pub fn ingest_with<R, S>(
        &self,
        stream: R,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<TelemetrySnapshot, IngestError>
    where
        R: Read,
        S: RecordSink + ?Sized,
    {
        self.run(stream, &self.config.fields, sink, cancel)
    }

    /// Gather `"name"` and `"gender"` into memory.
    pub fn collect<R: Read>(&self, stream: R, cancel: &CancellationToken) -> Result<ParseResult, IngestError> {
        let fields: Vec<String> = DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect();
        let mut result = ParseResult::default();
        self.run(stream, &fields, &mut result, cancel)?;
        Ok(result)
    }

    fn run<R, S>(
        &self,
        stream: R,
        fields: &[String],
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<TelemetrySnapshot, IngestError>
    where
        R: Read,
        S: RecordSink + ?Sized,
    {
        debug!(
            fields = ?fields,
            read_buffer = self.config.read_buffer,
            max_depth = self.config.max_depth,
            "ingest started"
        );

        let longest = fields.iter().map(String::len).max().unwrap_or(0);
        let mut reader = RecordReader::new(
            stream,
            self.config.read_buffer,
            self.config.max_depth + ENVELOPING_LEVELS,
            name_limit(longest),
        );
        let mut pass = Pass {
            reader: &mut reader,
            fields,
            sink,
            cancel,
            per_element: self.config.check_cancel_per_element,
            counters: IngestCounters::default(),
            timer: TelemetryTimer::new(),
        };

        let walked = pass.document();
        let Pass { mut counters, mut timer, .. } = pass;
        // both close the stream before anything is reported
        let (stats, outcome) = match walked {
            Ok(()) => reader.finish(),
            Err(e) => (reader.close(), Err(e)),
        };
        counters.observe_reader(stats.bytes_read, stats.peak_depth, stats.peak_scratch);
        timer.finish();

        match outcome {
            Ok(()) => {
                debug!(
                    bytes = counters.bytes_read,
                    members = counters.members_seen,
                    skipped = counters.members_skipped,
                    delivered = counters.total_delivered(),
                    "ingest finished"
                );
                Ok(TelemetrySnapshot::from(&counters, &timer))
            }
            Err(e) => {
                warn!(error = %e, bytes = counters.bytes_read, delivered = counters.total_delivered(), "ingest stopped");
                Err(e)
            }
        }
    }
}

/// State of one pass over one document.
struct Pass<'a, R: Read, S: RecordSink + ?Sized> {
    reader: &'a mut RecordReader<R>,
    fields: &'a [String],
    sink: &'a mut S,
    cancel: &'a CancellationToken,
    per_element: bool,
    counters: IngestCounters,
    timer: TelemetryTimer,
}

impl<R: Read, S: RecordSink + ?Sized> Pass<'_, R, S> {
    fn check_cancel(&self) -> Result<(), IngestError> {
        if self.cancel.is_cancelled() {
            return Err(IngestError::Cancelled { delivered: self.counters.total_delivered() });
        }
        Ok(())
    }

    fn document(&mut self) -> Result<(), IngestError> {
        self.check_cancel()?;
        self.reader.begin_object()?;

        loop {
            self.check_cancel()?;
            let t = Instant::now();
            if !self.reader.has_next()? {
                break;
            }
            let name = self.reader.next_name()?;
            self.timer.add_stage_time(Stage::Scan, t.elapsed());

            let fields = self.fields;
            match fields.iter().find(|f| **f == name) {
                Some(field) => {
                    self.counters.add_member(false);
                    trace!(member = %field, "tracked member");
                    self.scan_array(field)?;
                }
                None => {
                    self.counters.add_member(true);
                    trace!(member = %name, "skipping member");
                    let t = Instant::now();
                    self.reader.skip_value()?;
                    self.timer.add_stage_time(Stage::Skip, t.elapsed());
                }
            }
        }

        self.reader.end_object()
    }

    fn scan_array(&mut self, field: &str) -> Result<(), IngestError> {
        match self.reader.peek()? {
            ValueType::Array => {}
            // absent list
            ValueType::Null => {
                self.reader.next_null()?;
                return Ok(());
            }
            other => {
                return Err(IngestError::parse(
                    self.reader.offset(),
                    format!("member {field:?} must be an array, found {other:?}"),
                ))
            }
        }

        self.reader.begin_array()?;
        let mut index = 0u64;
        loop {
            if self.per_element {
                self.check_cancel()?;
            }
            if !self.reader.has_next()? {
                break;
            }

            let start = self.reader.offset();
            let t = Instant::now();
            let record = self.reader.read_value()?;
            self.timer.add_stage_time(Stage::Decode, t.elapsed());
            self.counters.add_record(field, self.reader.offset() - start);
            trace!(field, index, "record decoded");

            let t = Instant::now();
            self.sink.on_record(field, record);
            self.timer.add_stage_time(Stage::Deliver, t.elapsed());
            index += 1;
        }
        self.reader.end_array()?;
        Ok(())
    }
}
