//! Decoding one value into an owned `serde_json::Value`.

use std::io::Read;

use serde_json::{Map, Value};
use struson::reader::ValueType;

use crate::json::reader::RecordReader;
use crate::types::IngestError;

impl<R: Read> RecordReader<R> {
    /// Decode the next value in full. Nesting is bounded by the parser's
    /// depth limit, so recursion is bounded too.
    pub fn read_value(&mut self) -> Result<Value, IngestError> {
        match self.peek()? {
            ValueType::Object => {
                self.begin_object()?;
                let mut map = Map::new();
                while self.has_next()? {
                    let name = self.next_name()?;
                    let value = self.read_value()?;
                    map.insert(name, value);
                }
                self.end_object()?;
                Ok(Value::Object(map))
            }
            ValueType::Array => {
                self.begin_array()?;
                let mut items = Vec::new();
                while self.has_next()? {
                    items.push(self.read_value()?);
                }
                self.end_array()?;
                Ok(Value::Array(items))
            }
            ValueType::String => self.next_string().map(Value::String),
            ValueType::Number => self.next_number().map(Value::Number),
            ValueType::Boolean => self.next_bool().map(Value::Bool),
            ValueType::Null => self.next_null().map(|()| Value::Null),
        }
    }
}
