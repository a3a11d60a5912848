use byteorder::{ByteOrder, LittleEndian};
use num_enum::TryFromPrimitive;

use crate::envelope::types::{EnvelopeError, FrameHeader, FrameType};
use crate::headers::HEADER_LEN_V1;

#[inline]
pub fn encode_frame_header(h: &FrameHeader) -> [u8; FrameHeader::LEN] {
    let mut out = [0u8; FrameHeader::LEN];
    out[0] = h.frame_type as u8;
    LittleEndian::write_u32(&mut out[1..5], h.frame_index);
    LittleEndian::write_u32(&mut out[5..9], h.ciphertext_len);
    out
}

#[inline]
pub fn parse_frame_header(wire: &[u8; FrameHeader::LEN]) -> Result<FrameHeader, EnvelopeError> {
    let frame_type = FrameType::try_from_primitive(wire[0])
        .map_err(|_| EnvelopeError::InvalidFrameType(wire[0]))?;

    Ok(FrameHeader {
        frame_type,
        frame_index: LittleEndian::read_u32(&wire[1..5]),
        ciphertext_len: LittleEndian::read_u32(&wire[5..9]),
    })
}

/// AAD for one frame: encoded frame header followed by the encoded stream header.
/// Binds every frame to its position, its type and the stream it belongs to.
#[inline]
pub fn build_frame_aad(
    frame_header: &[u8; FrameHeader::LEN],
    stream_header: &[u8; HEADER_LEN_V1],
) -> [u8; FrameHeader::LEN + HEADER_LEN_V1] {
    let mut aad = [0u8; FrameHeader::LEN + HEADER_LEN_V1];
    aad[..FrameHeader::LEN].copy_from_slice(frame_header);
    aad[FrameHeader::LEN..].copy_from_slice(stream_header);
    aad
}
