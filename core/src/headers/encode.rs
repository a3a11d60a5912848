//! Header encoding.
//!
//! Field order must match `decode.rs` exactly.

use crate::headers::types::{EnvelopeHeader, HeaderError, HEADER_CRC_SPAN, HEADER_LEN_V1};
use crate::utils::compute_crc32;

/// Serialize an `EnvelopeHeader` into its 48-byte little-endian form.
///
/// The header is validated first; the trailing CRC32 is computed here and
/// never taken from the struct.
pub fn encode_header_le(h: &EnvelopeHeader) -> Result<[u8; HEADER_LEN_V1], HeaderError> {
    h.validate()?;

    let mut out = [0u8; HEADER_LEN_V1];
    let mut i = 0usize;

    fn put_u16(out: &mut [u8], i: &mut usize, v: u16) {
        out[*i..*i + 2].copy_from_slice(&v.to_le_bytes());
        *i += 2;
    }
    fn put_u32(out: &mut [u8], i: &mut usize, v: u32) {
        out[*i..*i + 4].copy_from_slice(&v.to_le_bytes());
        *i += 4;
    }
    fn put_bytes(out: &mut [u8], i: &mut usize, b: &[u8]) {
        out[*i..*i + b.len()].copy_from_slice(b);
        *i += b.len();
    }

    put_bytes(&mut out, &mut i, &h.magic);    // 0..4   magic
    put_u16(&mut out, &mut i, h.version);     // 4..6   version
    put_u16(&mut out, &mut i, h.cipher);      // 6..8   cipher suite
    put_u16(&mut out, &mut i, h.hkdf_prf);    // 8..10  HKDF PRF
    put_u16(&mut out, &mut i, h.flags);       // 10..12 flags
    put_u32(&mut out, &mut i, h.chunk_size);  // 12..16 chunk size
    put_bytes(&mut out, &mut i, &h.salt);     // 16..32 salt
    put_u32(&mut out, &mut i, h.key_id);      // 32..36 key id
    put_bytes(&mut out, &mut i, &h.reserved); // 36..44 reserved

    debug_assert_eq!(i, HEADER_CRC_SPAN);
    let crc = compute_crc32(&out[..HEADER_CRC_SPAN]);
    put_u32(&mut out, &mut i, crc);           // 44..48 crc32

    debug_assert_eq!(i, HEADER_LEN_V1, "encoding wrote incorrect length");
    Ok(out)
}
