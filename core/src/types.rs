use std::io;

use struson::reader::ReaderError;
use thiserror::Error;

use crate::json::{NameSyntaxError, SourceMap};

/// Terminal outcome of a failed ingest. The first failure wins; nothing is
/// retried and the stream is already dropped when this is returned.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed input, including depth limit, invalid UTF-8, a tracked member
    /// that is not an array, and data after the document.
    #[error("parse error at byte {offset}: {message}")]
    Parse { offset: u64, message: String },

    /// Read failure, including envelope authentication failures.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stopped by the cancellation token.
    #[error("cancelled after {delivered} records")]
    Cancelled { delivered: u64 },
}

/// Coarse error class, handy for logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Io,
    Cancelled,
}

impl IngestError {
    pub fn parse(offset: u64, message: impl Into<String>) -> Self {
        IngestError::Parse { offset, message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Parse { .. } => ErrorKind::Parse,
            IngestError::Io(_) => ErrorKind::Io,
            IngestError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Byte offset of a parse error.
    pub fn offset(&self) -> Option<u64> {
        match self {
            IngestError::Parse { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

impl IngestError {
    /// Convert a parser error. Parser positions are mapped back to stream
    /// offsets through `source`; `position` is where the parser stood when
    /// the error does not carry one.
    pub(crate) fn from_reader(e: ReaderError, source: &SourceMap, position: Option<u64>) -> Self {
        match e {
            ReaderError::IoError { error, .. } => match NameSyntaxError::find(&error) {
                Some(name) => IngestError::parse(source.source_offset(name.position), name.to_string()),
                None => IngestError::Io(error),
            },
            // ran out of input: the error lies at or past the last byte read
            ReaderError::SyntaxError(syntax) if source.at_eof() => {
                IngestError::parse(source.consumed(), syntax.to_string())
            }
            ReaderError::SyntaxError(syntax) => {
                let offset = syntax.location.data_pos.map_or(source.consumed(), |p| source.source_offset(p));
                IngestError::parse(offset, syntax.to_string())
            }
            other => {
                let offset = position.map_or(source.consumed(), |p| source.source_offset(p));
                IngestError::parse(offset, other.to_string())
            }
        }
    }
}
