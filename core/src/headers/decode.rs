//! Header decoding.
//!
//! Decoding rejects CRC mismatches before field validation so a corrupted
//! header reports corruption rather than whichever field it happened to hit.

use byteorder::{ByteOrder, LittleEndian};

use crate::headers::types::{EnvelopeHeader, HeaderError, HEADER_CRC_SPAN};
use crate::utils::compute_crc32;

/// Deserialize a 48-byte little-endian header.
pub fn decode_header_le(buf: &[u8]) -> Result<EnvelopeHeader, HeaderError> {
    if buf.len() < EnvelopeHeader::LEN {
        return Err(HeaderError::BufferTooShort { have: buf.len(), need: EnvelopeHeader::LEN });
    }

    let stored_crc = LittleEndian::read_u32(&buf[HEADER_CRC_SPAN..EnvelopeHeader::LEN]);
    let computed_crc = compute_crc32(&buf[..HEADER_CRC_SPAN]);
    if stored_crc != computed_crc {
        return Err(HeaderError::InvalidCrc32 { have: stored_crc, need: computed_crc });
    }

    let mut h = EnvelopeHeader::default();
    h.magic.copy_from_slice(&buf[0..4]);
    h.version    = LittleEndian::read_u16(&buf[4..6]);
    h.cipher     = LittleEndian::read_u16(&buf[6..8]);
    h.hkdf_prf   = LittleEndian::read_u16(&buf[8..10]);
    h.flags      = LittleEndian::read_u16(&buf[10..12]);
    h.chunk_size = LittleEndian::read_u32(&buf[12..16]);
    h.salt.copy_from_slice(&buf[16..32]);
    h.key_id     = LittleEndian::read_u32(&buf[32..36]);
    h.reserved.copy_from_slice(&buf[36..44]);

    h.validate()?;
    Ok(h)
}
