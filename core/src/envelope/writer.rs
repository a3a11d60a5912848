//! Encrypting `Write` adapter producing the envelope format read by
//! [`DecryptingReader`](crate::envelope::DecryptingReader).

use std::io::{self, Write};

use tracing::debug;

use crate::crypto::{derive_nonce_12_tls_style, derive_session_key_32, AeadImpl, CryptoError};
use crate::envelope::framing::{build_frame_aad, encode_frame_header};
use crate::envelope::types::{EnvelopeError, FrameHeader};
use crate::headers::{encode_header_le, EnvelopeHeader, HEADER_LEN_V1};

pub struct EncryptingWriter<W: Write> {
    inner: W,
    header: EnvelopeHeader,
    header_bytes: [u8; HEADER_LEN_V1],
    aead: AeadImpl,
    chunk_size: usize,
    buf: Vec<u8>,
    next_index: u32,
    plaintext_total: u64,
}

impl<W: Write> EncryptingWriter<W> {
    /// Validate and write the stream header immediately.
    pub fn new(mut inner: W, master_key: &[u8], header: EnvelopeHeader) -> Result<Self, EnvelopeError> {
        let header_bytes = encode_header_le(&header)?;
        let session_key = derive_session_key_32(master_key, &header)?;
        let aead = AeadImpl::from_header_and_key(&header, &session_key)?;
        inner.write_all(&header_bytes)?;

        let chunk_size = header.chunk_size as usize;
        Ok(Self {
            inner,
            header,
            header_bytes,
            aead,
            chunk_size,
            buf: Vec::with_capacity(chunk_size),
            next_index: 0,
            plaintext_total: 0,
        })
    }

    pub fn header(&self) -> &EnvelopeHeader {
        &self.header
    }

    fn seal_frame(&mut self, fh: FrameHeader, plaintext: &[u8]) -> Result<(), EnvelopeError> {
        let fh_bytes = encode_frame_header(&fh);
        let nonce = derive_nonce_12_tls_style(&self.header.salt, fh.frame_index as u64)
            .map_err(CryptoError::from)?;
        let aad = build_frame_aad(&fh_bytes, &self.header_bytes);
        let ciphertext = self.aead.seal(&nonce, &aad, plaintext)?;
        debug_assert_eq!(ciphertext.len(), fh.ciphertext_len as usize);

        self.inner.write_all(&fh_bytes)?;
        self.inner.write_all(&ciphertext)?;
        self.next_index = self.next_index.checked_add(1).ok_or(EnvelopeError::FrameIndexOverflow)?;
        Ok(())
    }

    fn emit_data(&mut self, len: usize) -> Result<(), EnvelopeError> {
        let chunk: Vec<u8> = self.buf.drain(..len).collect();
        let fh = FrameHeader::data(self.next_index, chunk.len());
        self.seal_frame(fh, &chunk)?;
        self.plaintext_total += chunk.len() as u64;
        Ok(())
    }

    /// Flush buffered plaintext as a last data frame, append the final frame and
    /// return the inner writer.
    pub fn finish(mut self) -> Result<W, EnvelopeError> {
        if !self.buf.is_empty() {
            let len = self.buf.len();
            self.emit_data(len)?;
        }

        let total = self.plaintext_total.to_le_bytes();
        let fh = FrameHeader::final_marker(self.next_index);
        self.seal_frame(fh, &total)?;
        self.inner.flush()?;

        debug!(frames = self.next_index, bytes = self.plaintext_total, "envelope sealed");
        Ok(self.inner)
    }
}

impl<W: Write> Write for EncryptingWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        while self.buf.len() >= self.chunk_size {
            let chunk = self.chunk_size;
            self.emit_data(chunk)?;
        }
        Ok(data.len())
    }

    /// Flushes the inner writer only; partial frames stay buffered until
    /// they fill up or `finish` is called.
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Seal a complete plaintext into an envelope in memory.
pub fn encrypt_to_vec(plaintext: &[u8], master_key: &[u8], header: EnvelopeHeader) -> Result<Vec<u8>, EnvelopeError> {
    let mut writer = EncryptingWriter::new(Vec::new(), master_key, header)?;
    writer.write_all(plaintext)?;
    writer.finish()
}
