//! json — bounded-memory pull reading of RFC 8259 documents.
//!
//! Tokenizing is done by `struson`. `names` keeps top-level member names
//! short before they reach it. `reader` maps its errors and positions onto
//! `IngestError`, and `value` decodes one element into `serde_json::Value`.

pub mod names;
pub mod reader;
pub mod value;

pub use names::{name_limit, NameSyntaxError, SourceMap};
pub use reader::{ReadStats, RecordReader};
pub use struson::reader::ValueType;
