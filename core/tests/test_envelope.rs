// Encrypted input: every cipher/PRF pairing round-trips through the
// ingestor, and every form of tampering surfaces as an I/O error.

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use ingest_core::envelope::{encrypt_to_vec, DecryptingReader, EncryptingWriter, EnvelopeError, FrameHeader};
    use ingest_core::headers::{CipherSuite, EnvelopeHeader, HkdfPrf, HEADER_LEN_V1};
    use ingest_core::prelude::*;
    use serde_json::json;

    const KEY: [u8; 32] = [0x42; 32];

    fn document(count: usize) -> String {
        let names: Vec<String> = (0..count).map(|i| format!("person-{i}")).collect();
        format!(
            r#"{{"meta":{{"source":"registry"}},"name":{},"gender":["f","m"]}}"#,
            serde_json::to_string(&names).unwrap()
        )
    }

    fn small_frames() -> EnvelopeHeader {
        EnvelopeHeader::random().with_chunk_size(4096)
    }

    fn ingest_sealed(sealed: Vec<u8>) -> Result<ParseResult, IngestError> {
        let stream = EncodedStream::open(InputSource::Memory(sealed), Some(&KEY))?;
        StreamingRecordIngestor::new(IngestConfig::default())
            .unwrap()
            .collect(stream, &CancellationToken::new())
    }

    #[test]
    fn all_suites_round_trip_through_ingest() {
        let doc = document(2000);
        for cipher in [CipherSuite::Aes256Gcm, CipherSuite::Chacha20Poly1305] {
            for prf in [HkdfPrf::Sha256, HkdfPrf::Sha512, HkdfPrf::Blake3K] {
                let header = small_frames().with_cipher(cipher).with_prf(prf);
                let sealed = encrypt_to_vec(doc.as_bytes(), &KEY, header).unwrap();
                let result = ingest_sealed(sealed).unwrap();
                assert_eq!(result.names.len(), 2000, "{cipher:?}/{prf:?}");
                assert_eq!(result.names[1999], json!("person-1999"));
                assert_eq!(result.genders, vec![json!("f"), json!("m")]);
            }
        }
    }

    #[test]
    fn empty_plaintext_has_only_final_frame() {
        let sealed = encrypt_to_vec(b"", &KEY, EnvelopeHeader::random()).unwrap();
        assert_eq!(sealed.len(), HEADER_LEN_V1 + FrameHeader::LEN + 8 + 16);

        let mut reader = DecryptingReader::new(sealed.as_slice(), &KEY).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(reader.frames_read(), 1);
    }

    #[test]
    fn streaming_writer_matches_one_shot() -> anyhow::Result<()> {
        let doc = document(500);
        let header = small_frames();
        let mut writer = EncryptingWriter::new(Vec::new(), &KEY, header.clone())?;
        for piece in doc.as_bytes().chunks(333) {
            io::Write::write_all(&mut writer, piece)?;
        }
        let streamed = writer.finish()?;
        let one_shot = encrypt_to_vec(doc.as_bytes(), &KEY, header)?;
        assert_eq!(streamed, one_shot);
        Ok(())
    }

    #[test]
    fn flipped_ciphertext_bit_is_io_error() {
        let mut sealed = encrypt_to_vec(document(300).as_bytes(), &KEY, small_frames()).unwrap();
        let at = HEADER_LEN_V1 + FrameHeader::LEN + 100;
        sealed[at] ^= 0x01;
        let err = ingest_sealed(sealed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn wrong_key_is_io_error() {
        let sealed = encrypt_to_vec(document(10).as_bytes(), &KEY, small_frames()).unwrap();
        let stream = EncodedStream::open(InputSource::Memory(sealed), Some(&[0x24; 32])).unwrap();
        let err = StreamingRecordIngestor::new(IngestConfig::default())
            .unwrap()
            .collect(stream, &CancellationToken::new())
            .unwrap_err();
        match err {
            IngestError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected I/O error, got {other:?}"),
        }
    }

    #[test]
    fn truncated_envelope_is_unexpected_eof() {
        let sealed = encrypt_to_vec(document(300).as_bytes(), &KEY, small_frames()).unwrap();

        // inside a frame
        let cut = sealed[..sealed.len() - 10].to_vec();
        match ingest_sealed(cut).unwrap_err() {
            IngestError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected I/O error, got {other:?}"),
        }

        // final frame dropped entirely: the JSON may look complete, the envelope is not
        let without_final = sealed[..sealed.len() - (FrameHeader::LEN + 8 + 16)].to_vec();
        match ingest_sealed(without_final).unwrap_err() {
            IngestError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected I/O error, got {other:?}"),
        }
    }

    #[test]
    fn short_header_is_rejected_on_open() {
        let err = EncodedStream::open(InputSource::Memory(vec![b'R'; 10]), Some(&KEY)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn trailing_bytes_after_final_frame() {
        let mut sealed = encrypt_to_vec(b"{}", &KEY, small_frames()).unwrap();
        sealed.push(0);
        let mut reader = DecryptingReader::new(sealed.as_slice(), &KEY).unwrap();
        let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
        let inner = err.into_inner().unwrap().downcast::<EnvelopeError>().unwrap();
        assert!(matches!(*inner, EnvelopeError::TrailingData));
    }

    #[test]
    fn swapped_frames_are_out_of_order() {
        let header = small_frames();
        let plaintext = vec![b' '; 4096 * 2];
        let sealed = encrypt_to_vec(&plaintext, &KEY, header).unwrap();

        let frame_len = FrameHeader::LEN + 4096 + 16;
        let first = HEADER_LEN_V1;
        let second = first + frame_len;
        let mut swapped = sealed[..first].to_vec();
        swapped.extend_from_slice(&sealed[second..second + frame_len]);
        swapped.extend_from_slice(&sealed[first..second]);
        swapped.extend_from_slice(&sealed[second + frame_len..]);

        let mut reader = DecryptingReader::new(swapped.as_slice(), &KEY).unwrap();
        let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let inner = err.into_inner().unwrap().downcast::<EnvelopeError>().unwrap();
        assert!(matches!(*inner, EnvelopeError::OutOfOrder { expected: 0, got: 1 }));
    }
}
