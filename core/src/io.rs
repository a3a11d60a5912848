//! Normalized input: where the bytes come from and whether they are sealed.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use crate::envelope::DecryptingReader;

/// Canonical input abstraction
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Reader(_) => f.write_str("Reader(..)"),
            InputSource::File(p) => f.debug_tuple("File").field(p).finish(),
            InputSource::Memory(b) => write!(f, "Memory({} bytes)", b.len()),
        }
    }
}

/// Normalize input source into a boxed reader
pub fn open_input(src: InputSource) -> io::Result<Box<dyn Read + Send>> {
    let reader: Box<dyn Read + Send> = match src {
        InputSource::Reader(r) => r,
        InputSource::File(p) => Box::new(std::fs::File::open(p)?),
        InputSource::Memory(b) => Box::new(Cursor::new(b)),
    };
    Ok(reader)
}

/// Byte stream handed to the ingestor: plain JSON, or JSON inside an
/// encryption envelope that is opened on the fly.
pub enum EncodedStream {
    Plain(Box<dyn Read + Send>),
    Encrypted(DecryptingReader<Box<dyn Read + Send>>),
}

impl EncodedStream {
    /// Open `src`; with a master key the envelope header is read and
    /// authenticated before this returns.
    pub fn open(src: InputSource, master_key: Option<&[u8]>) -> io::Result<Self> {
        let reader = open_input(src)?;
        match master_key {
            None => Ok(EncodedStream::Plain(reader)),
            Some(key) => Ok(EncodedStream::Encrypted(DecryptingReader::new(reader, key)?)),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, EncodedStream::Encrypted(_))
    }
}

impl Read for EncodedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EncodedStream::Plain(r) => r.read(buf),
            EncodedStream::Encrypted(r) => r.read(buf),
        }
    }
}

impl fmt::Debug for EncodedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodedStream::Plain(_) => f.write_str("EncodedStream::Plain"),
            EncodedStream::Encrypted(r) => f
                .debug_struct("EncodedStream::Encrypted")
                .field("key_id", &r.header().key_id)
                .finish(),
        }
    }
}
