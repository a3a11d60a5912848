//! ingest — the streaming record ingestor and its execution helpers.

pub mod types;
pub mod core;
pub mod background;

pub use types::*;
pub use self::core::StreamingRecordIngestor;
pub use background::{spawn_ingest, FieldEvent, IngestHandle};
