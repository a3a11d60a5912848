//! Decrypting `Read` adapter.
//!
//! Holds at most one decrypted frame in memory. Every envelope failure is
//! reported through `std::io::Error` so callers see a plain byte source.

use std::io::{self, Read};

use bytes::{Buf, Bytes};
use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace};

use crate::crypto::{derive_nonce_12_tls_style, derive_session_key_32, AeadImpl, CryptoError, TAG_LEN};
use crate::envelope::framing::{build_frame_aad, encode_frame_header, parse_frame_header};
use crate::envelope::types::{EnvelopeError, FrameHeader, FrameType, FINAL_PAYLOAD_LEN};
use crate::headers::{decode_header_le, EnvelopeHeader, HEADER_LEN_V1};

pub struct DecryptingReader<R: Read> {
    inner: R,
    header: EnvelopeHeader,
    header_bytes: [u8; HEADER_LEN_V1],
    aead: AeadImpl,
    next_index: u32,
    pending: Bytes,
    plaintext_total: u64,
    frames_read: u64,
    finished: bool,
}

impl<R: Read> DecryptingReader<R> {
    /// Consume and validate the stream header, derive the session key.
    pub fn new(mut inner: R, master_key: &[u8]) -> Result<Self, EnvelopeError> {
        let mut header_bytes = [0u8; HEADER_LEN_V1];
        let have = read_full(&mut inner, &mut header_bytes)?;
        if have < HEADER_LEN_V1 {
            return Err(EnvelopeError::MissingHeader { have });
        }

        let header = decode_header_le(&header_bytes)?;
        let session_key = derive_session_key_32(master_key, &header)?;
        let aead = AeadImpl::from_header_and_key(&header, &session_key)?;
        debug!(
            key_id = header.key_id,
            chunk_size = header.chunk_size,
            cipher = header.cipher,
            "envelope header accepted"
        );

        Ok(Self {
            inner,
            header,
            header_bytes,
            aead,
            next_index: 0,
            pending: Bytes::new(),
            plaintext_total: 0,
            frames_read: 0,
            finished: false,
        })
    }

    pub fn header(&self) -> &EnvelopeHeader {
        &self.header
    }

    /// Frames authenticated so far, final frame included.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read, authenticate and buffer the next frame.
    fn next_frame(&mut self) -> Result<(), EnvelopeError> {
        let mut fh_bytes = [0u8; FrameHeader::LEN];
        match read_full(&mut self.inner, &mut fh_bytes)? {
            0 => return Err(EnvelopeError::MissingFinalFrame),
            n if n < FrameHeader::LEN => {
                return Err(EnvelopeError::Truncated { frame_index: self.next_index })
            }
            _ => {}
        }

        let fh = parse_frame_header(&fh_bytes)?;
        if fh.frame_index != self.next_index {
            return Err(EnvelopeError::OutOfOrder { expected: self.next_index, got: fh.frame_index });
        }

        let (min, max) = match fh.frame_type {
            FrameType::Data => (TAG_LEN + 1, self.header.chunk_size as usize + TAG_LEN),
            FrameType::Final => (FINAL_PAYLOAD_LEN + TAG_LEN, FINAL_PAYLOAD_LEN + TAG_LEN),
        };
        let ct_len = fh.ciphertext_len as usize;
        if ct_len < min || ct_len > max {
            return Err(EnvelopeError::InvalidFrameLen {
                frame_type: fh.frame_type,
                have: fh.ciphertext_len,
                max: max as u32,
            });
        }

        let mut ciphertext = vec![0u8; ct_len];
        if read_full(&mut self.inner, &mut ciphertext)? < ct_len {
            return Err(EnvelopeError::Truncated { frame_index: fh.frame_index });
        }

        let nonce = derive_nonce_12_tls_style(&self.header.salt, fh.frame_index as u64)
            .map_err(CryptoError::from)?;
        let aad = build_frame_aad(&encode_frame_header(&fh), &self.header_bytes);
        let plaintext = self.aead.open(&nonce, &aad, &ciphertext)?;

        self.frames_read += 1;
        self.next_index = self.next_index.checked_add(1).ok_or(EnvelopeError::FrameIndexOverflow)?;

        match fh.frame_type {
            FrameType::Data => {
                trace!(frame = fh.frame_index, len = plaintext.len(), "data frame");
                self.plaintext_total += plaintext.len() as u64;
                self.pending = Bytes::from(plaintext);
            }
            FrameType::Final => {
                let declared = LittleEndian::read_u64(&plaintext);
                if declared != self.plaintext_total {
                    return Err(EnvelopeError::LengthMismatch { declared, actual: self.plaintext_total });
                }
                let mut probe = [0u8; 1];
                if read_full(&mut self.inner, &mut probe)? != 0 {
                    return Err(EnvelopeError::TrailingData);
                }
                debug!(frames = self.frames_read, bytes = self.plaintext_total, "envelope complete");
                self.finished = true;
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for DecryptingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pending.is_empty() {
            if self.finished {
                return Ok(0);
            }
            self.next_frame()?;
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}

/// Fill `buf` until full or EOF; returns the number of bytes read.
pub(crate) fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut off = 0;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(off)
}
