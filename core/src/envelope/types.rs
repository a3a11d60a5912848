use std::fmt;
use std::io;
use num_enum::TryFromPrimitive;

use crate::crypto::{CryptoError, TAG_LEN};
use crate::headers::HeaderError;

/// Frame type identifiers.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum FrameType {
    /// Up to `chunk_size` bytes of plaintext.
    Data  = 0x01,
    /// Authenticated end marker carrying the total plaintext length (u64 LE).
    Final = 0x02,
}

/// Plaintext carried by a final frame.
pub const FINAL_PAYLOAD_LEN: usize = 8;

/// Fixed per-frame header. All fields little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub frame_index: u32,
    /// Ciphertext bytes following the header, tag included.
    pub ciphertext_len: u32,
}

impl FrameHeader {
    pub const LEN: usize = 1 // frame_type
        + 4                  // frame_index
        + 4;                 // ciphertext_len

    pub fn data(frame_index: u32, plaintext_len: usize) -> Self {
        Self {
            frame_type: FrameType::Data,
            frame_index,
            ciphertext_len: (plaintext_len + TAG_LEN) as u32,
        }
    }

    pub fn final_marker(frame_index: u32) -> Self {
        Self {
            frame_type: FrameType::Final,
            frame_index,
            ciphertext_len: (FINAL_PAYLOAD_LEN + TAG_LEN) as u32,
        }
    }
}

#[derive(Debug)]
pub enum EnvelopeError {
    /// Underlying reader/writer failure.
    Io(io::Error),

    Header(HeaderError),

    Crypto(CryptoError),

    /// Stream ended before the stream header was complete.
    MissingHeader { have: usize },

    InvalidFrameType(u8),

    /// Frame index does not follow the previous frame.
    OutOfOrder { expected: u32, got: u32 },

    /// Declared ciphertext length outside what the frame type allows.
    InvalidFrameLen { frame_type: FrameType, have: u32, max: u32 },

    /// Stream ended inside a frame.
    Truncated { frame_index: u32 },

    /// Stream ended without an authenticated final frame.
    MissingFinalFrame,

    /// Final frame total does not match the plaintext actually decrypted.
    LengthMismatch { declared: u64, actual: u64 },

    /// Bytes present after the final frame.
    TrailingData,

    /// Frame counter exhausted.
    FrameIndexOverflow,
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use EnvelopeError::*;
        match self {
            Io(e) => write!(f, "I/O error: {}", e),
            Header(e) => write!(f, "header error: {}", e),
            Crypto(e) => write!(f, "crypto error: {}", e),
            MissingHeader { have } =>
                write!(f, "stream ended inside envelope header after {} bytes", have),
            InvalidFrameType(raw) => write!(f, "invalid frame type: 0x{:02x}", raw),
            OutOfOrder { expected, got } =>
                write!(f, "frame out of order: expected index {}, got {}", expected, got),
            InvalidFrameLen { frame_type, have, max } =>
                write!(f, "invalid {:?} frame length: {} (max {})", frame_type, have, max),
            Truncated { frame_index } => write!(f, "stream truncated inside frame {}", frame_index),
            MissingFinalFrame => write!(f, "stream ended without final frame"),
            LengthMismatch { declared, actual } =>
                write!(f, "plaintext length mismatch: final frame declares {}, decrypted {}", declared, actual),
            TrailingData => write!(f, "unexpected data after final frame"),
            FrameIndexOverflow => write!(f, "frame index overflow"),
        }
    }
}

impl std::error::Error for EnvelopeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnvelopeError::Io(e) => Some(e),
            EnvelopeError::Header(e) => Some(e),
            EnvelopeError::Crypto(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EnvelopeError {
    fn from(e: io::Error) -> Self {
        EnvelopeError::Io(e)
    }
}

impl From<HeaderError> for EnvelopeError {
    fn from(e: HeaderError) -> Self {
        EnvelopeError::Header(e)
    }
}

impl From<CryptoError> for EnvelopeError {
    fn from(e: CryptoError) -> Self {
        EnvelopeError::Crypto(e)
    }
}

/// Envelope failures surface through `std::io::Read` / `Write` as I/O errors.
/// Premature end of stream maps to `UnexpectedEof`, everything else to `InvalidData`.
impl From<EnvelopeError> for io::Error {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::Io(inner) => inner,
            EnvelopeError::MissingHeader { .. }
            | EnvelopeError::Truncated { .. }
            | EnvelopeError::MissingFinalFrame => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
