//! ingest-core
//!
//! Bounded-memory ingestion of large JSON documents shaped like
//! `{"name": [...], "gender": [...], ...}`, read from a plain or encrypted
//! byte stream. Elements of tracked members are decoded one at a time and
//! handed to the caller; every other member is skipped token by token.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod config;
pub mod cancel;
pub mod io;

// Parsing
pub mod json;

// Envelope layers
pub mod headers;
pub mod crypto;
pub mod envelope;

pub mod telemetry;
pub mod ingest;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::cancel::CancellationToken;
    pub use crate::config::{ConfigError, IngestConfig};
    pub use crate::ingest::{
        spawn_ingest, FieldCallbacks, FieldEvent, FieldRecord, IngestHandle, ParseResult, RecordSink,
        StreamingRecordIngestor,
    };
    pub use crate::io::{EncodedStream, InputSource};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{ErrorKind, IngestError};
}
