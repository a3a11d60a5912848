use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One decoded array element. Its shape is opaque to the ingestor.
pub type FieldRecord = Value;

/// Receives decoded elements of tracked members, in document order.
///
/// The record is moved in; the ingestor keeps no reference to it.
pub trait RecordSink {
    fn on_record(&mut self, field: &str, record: FieldRecord);
}

impl<F> RecordSink for F
where
    F: FnMut(&str, FieldRecord),
{
    fn on_record(&mut self, field: &str, record: FieldRecord) {
        self(field, record)
    }
}

/// Routes `"name"` and `"gender"` elements to two callbacks.
pub struct FieldCallbacks<N, G> {
    pub on_name: N,
    pub on_gender: G,
}

impl<N, G> RecordSink for FieldCallbacks<N, G>
where
    N: FnMut(FieldRecord),
    G: FnMut(FieldRecord),
{
    fn on_record(&mut self, field: &str, record: FieldRecord) {
        match field {
            "name" => (self.on_name)(record),
            "gender" => (self.on_gender)(record),
            _ => {}
        }
    }
}

/// Both sequences gathered in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub names: Vec<FieldRecord>,
    pub genders: Vec<FieldRecord>,
}

impl RecordSink for ParseResult {
    fn on_record(&mut self, field: &str, record: FieldRecord) {
        match field {
            "name" => self.names.push(record),
            "gender" => self.genders.push(record),
            _ => {}
        }
    }
}
