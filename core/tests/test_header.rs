// Envelope header: registry verification, wire layout, CRC and
// validation failures.

#[cfg(test)]
mod tests {
    use ingest_core::constants::{MAGIC_RIE1, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
    use ingest_core::headers::{
        decode_header_le, encode_header_le, CipherSuite, EnvelopeHeader, HeaderError, HkdfPrf, HEADER_LEN_V1,
    };
    use ingest_core::utils::{compute_crc32, enum_name_or_hex};

    fn header() -> EnvelopeHeader {
        let mut h = EnvelopeHeader::new_with_salt([0xA5; 16]);
        h.key_id = 0x0102_0304;
        h
    }

    #[test]
    fn cipher_suite_verify() {
        CipherSuite::verify(CipherSuite::Aes256Gcm as u16).unwrap();
        CipherSuite::verify(CipherSuite::Chacha20Poly1305 as u16).unwrap();
        CipherSuite::verify(0xDEAD).unwrap_err();
    }

    #[test]
    fn hkdf_prf_verify() {
        HkdfPrf::verify(HkdfPrf::Sha256 as u16).unwrap();
        HkdfPrf::verify(HkdfPrf::Sha512 as u16).unwrap();
        HkdfPrf::verify(HkdfPrf::Blake3K as u16).unwrap();
        HkdfPrf::verify(0xBEEF).unwrap_err();
    }

    #[test]
    fn encode_decode_round_trip() {
        let h = header().with_cipher(CipherSuite::Aes256Gcm).with_prf(HkdfPrf::Blake3K);
        let bytes = encode_header_le(&h).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN_V1);
        assert_eq!(decode_header_le(&bytes).unwrap(), h);
    }

    #[test]
    fn wire_layout_is_little_endian() {
        let bytes = encode_header_le(&header()).unwrap();
        assert_eq!(&bytes[0..4], &MAGIC_RIE1);
        assert_eq!(&bytes[4..6], &[1, 0]);
        assert_eq!(&bytes[6..8], &[2, 0]); // ChaCha20-Poly1305
        assert_eq!(&bytes[12..16], &(64u32 * 1024).to_le_bytes());
        assert_eq!(&bytes[16..32], &[0xA5; 16]);
        assert_eq!(&bytes[32..36], &[4, 3, 2, 1]);
        assert_eq!(&bytes[36..44], &[0; 8]);
        assert_eq!(&bytes[44..48], &compute_crc32(&bytes[..44]).to_le_bytes());
    }

    #[test]
    fn corrupted_byte_fails_crc() {
        let mut bytes = encode_header_le(&header()).unwrap();
        bytes[20] ^= 0xFF;
        assert!(matches!(decode_header_le(&bytes), Err(HeaderError::InvalidCrc32 { .. })));
    }

    #[test]
    fn short_buffer_rejected() {
        let bytes = encode_header_le(&header()).unwrap();
        assert!(matches!(
            decode_header_le(&bytes[..47]),
            Err(HeaderError::BufferTooShort { have: 47, need: 48 })
        ));
    }

    #[test]
    fn validation_failures() {
        let mut h = header();
        h.magic = *b"NOPE";
        assert!(matches!(h.validate(), Err(HeaderError::InvalidMagic { .. })));

        let mut h = header();
        h.version = 2;
        assert!(matches!(h.validate(), Err(HeaderError::InvalidVersion { have: 2 })));

        let mut h = header();
        h.cipher = 0x0777;
        assert!(matches!(h.validate(), Err(HeaderError::UnknownCipherSuite { raw: 0x0777 })));

        let mut h = header();
        h.flags = 1;
        assert!(matches!(h.validate(), Err(HeaderError::UnknownFlags { raw: 1 })));

        let h = header().with_chunk_size(MIN_CHUNK_SIZE as u32 - 1);
        assert!(matches!(h.validate(), Err(HeaderError::InvalidChunkSize { .. })));
        let h = header().with_chunk_size(MAX_CHUNK_SIZE as u32 + 1);
        assert!(matches!(h.validate(), Err(HeaderError::InvalidChunkSize { .. })));

        let h = EnvelopeHeader::new_with_salt([0; 16]);
        assert!(matches!(h.validate(), Err(HeaderError::InvalidSalt { .. })));

        let mut h = header();
        h.reserved[3] = 9;
        assert!(matches!(h.validate(), Err(HeaderError::ReservedBytesNonZero { .. })));
        assert!(encode_header_le(&h).is_err());
    }

    #[test]
    fn random_headers_are_valid_and_distinct() {
        let a = EnvelopeHeader::random();
        let b = EnvelopeHeader::random();
        a.validate().unwrap();
        assert_ne!(a.salt, b.salt);
    }

    #[test]
    fn error_messages_name_unknown_ids() {
        assert_eq!(enum_name_or_hex::<CipherSuite>(1), "Aes256Gcm");
        let msg = HeaderError::UnknownHkdfPrf { raw: 0x00FF }.to_string();
        assert!(msg.ends_with("0xff"), "{msg}");
    }
}
