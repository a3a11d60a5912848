//! Pull reader the ingest loop walks documents with.
//!
//! Tokenizing is done by `struson`. The wrapper feeds it through a
//! `NameLimit`, turns its errors into `IngestError` at stream offsets, and
//! keeps the peaks reported in telemetry.

use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;
use std::str::FromStr;

use serde_json::Number;
use struson::reader::{JsonReader, JsonStreamReader, ReaderError, ReaderSettings, ValueType};

use crate::json::names::{NameLimit, SourceMap};
use crate::types::IngestError;

/// What the reader saw, returned once it is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub bytes_read: u64,
    pub peak_depth: usize,
    /// Longest member name or string handed out.
    pub peak_scratch: usize,
}

pub struct RecordReader<R: Read> {
    json: JsonStreamReader<NameLimit<R>>,
    map: Rc<RefCell<SourceMap>>,
    depth: usize,
    peak_depth: usize,
    peak_scratch: usize,
}

impl<R: Read> RecordReader<R> {
    /// `read_buffer` bytes are requested per read, `max_depth` bounds the
    /// absolute nesting of objects and arrays, and top-level member names are
    /// cut after `name_limit` raw bytes.
    pub fn new(inner: R, read_buffer: usize, max_depth: usize, name_limit: usize) -> Self {
        let map = Rc::new(RefCell::new(SourceMap::default()));
        let limited = NameLimit::new(inner, read_buffer, name_limit, Rc::clone(&map));
        let settings = ReaderSettings {
            max_nesting_depth: Some(u32::try_from(max_depth).unwrap_or(u32::MAX)),
            track_path: false,
            ..Default::default()
        };
        Self {
            json: JsonStreamReader::new_custom(limited, settings),
            map,
            depth: 0,
            peak_depth: 0,
            peak_scratch: 0,
        }
    }

    /// Stream offset of the parser's current position.
    pub fn offset(&self) -> u64 {
        let map = self.map.borrow();
        match self.json.current_position(false).data_pos {
            Some(position) => map.source_offset(position),
            None => map.consumed(),
        }
    }

    fn fail(&self, e: ReaderError) -> IngestError {
        let position = self.json.current_position(false).data_pos;
        IngestError::from_reader(e, &self.map.borrow(), position)
    }

    pub fn has_next(&mut self) -> Result<bool, IngestError> {
        let more = self.json.has_next().map_err(|e| self.fail(e))?;
        if self.map.borrow().has_gaps() {
            if let Some(position) = self.json.current_position(false).data_pos {
                self.map.borrow_mut().settle(position);
            }
        }
        Ok(more)
    }

    pub fn peek(&mut self) -> Result<ValueType, IngestError> {
        self.json.peek().map_err(|e| self.fail(e))
    }

    pub fn begin_object(&mut self) -> Result<(), IngestError> {
        self.json.begin_object().map_err(|e| self.fail(e))?;
        self.enter();
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<(), IngestError> {
        self.json.end_object().map_err(|e| self.fail(e))?;
        self.depth -= 1;
        Ok(())
    }

    pub fn begin_array(&mut self) -> Result<(), IngestError> {
        self.json.begin_array().map_err(|e| self.fail(e))?;
        self.enter();
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<(), IngestError> {
        self.json.end_array().map_err(|e| self.fail(e))?;
        self.depth -= 1;
        Ok(())
    }

    pub fn next_name(&mut self) -> Result<String, IngestError> {
        let name = self.json.next_name().map(str::to_owned).map_err(|e| self.fail(e))?;
        self.peak_scratch = self.peak_scratch.max(name.len());
        Ok(name)
    }

    pub fn next_string(&mut self) -> Result<String, IngestError> {
        let s = self.json.next_string().map_err(|e| self.fail(e))?;
        self.peak_scratch = self.peak_scratch.max(s.len());
        Ok(s)
    }

    /// Same `Number` serde_json would produce for the literal.
    pub fn next_number(&mut self) -> Result<Number, IngestError> {
        let start = self.offset();
        let literal = self.json.next_number_as_str().map(str::to_owned).map_err(|e| self.fail(e))?;
        Number::from_str(&literal).map_err(|_| IngestError::parse(start, format!("number {literal} out of range")))
    }

    pub fn next_bool(&mut self) -> Result<bool, IngestError> {
        self.json.next_bool().map_err(|e| self.fail(e))
    }

    pub fn next_null(&mut self) -> Result<(), IngestError> {
        self.json.next_null().map_err(|e| self.fail(e))
    }

    /// Skip the next value without decoding it. Strings inside are
    /// validated but never buffered.
    pub fn skip_value(&mut self) -> Result<(), IngestError> {
        self.json.skip_value().map_err(|e| self.fail(e))
    }

    /// Require that only whitespace follows the top-level value, then close
    /// the stream.
    pub fn finish(self) -> (ReadStats, Result<(), IngestError>) {
        let RecordReader { json, map, peak_depth, peak_scratch, .. } = self;
        let result = json
            .consume_trailing_whitespace()
            .map_err(|e| IngestError::from_reader(e, &map.borrow(), None));
        let stats = ReadStats { bytes_read: map.borrow().consumed(), peak_depth, peak_scratch };
        (stats, result)
    }

    /// Close the stream without reading further.
    pub fn close(self) -> ReadStats {
        let RecordReader { json, map, peak_depth, peak_scratch, .. } = self;
        drop(json);
        let bytes_read = map.borrow().consumed();
        ReadStats { bytes_read, peak_depth, peak_scratch }
    }

    fn enter(&mut self) {
        self.depth += 1;
        self.peak_depth = self.peak_depth.max(self.depth);
    }
}
