//! AEAD interface for AES-256-GCM and ChaCha20-Poly1305.
//!
//! - Both ciphers use 32-byte keys and 12-byte nonces.
//! - Tag verification must fail closed (no partial plaintext).
//! - Cipher selection is driven by `header.cipher`.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use chacha20poly1305::{ChaCha20Poly1305, Nonce as ChaNonce};

use crate::constants::cipher_ids;
use crate::crypto::types::{CryptoError, KEY_LEN_32, NONCE_LEN_12, TAG_LEN};
use crate::headers::EnvelopeHeader;

/// Unified AEAD cipher selected by header.cipher.
#[derive(Clone)]
pub enum AeadImpl {
    AesGcm(Aes256Gcm),
    ChaCha(ChaCha20Poly1305),
}

impl AeadImpl {
    /// Construct from header.cipher and derived session key.
    pub fn from_header_and_key(header: &EnvelopeHeader, session_key: &[u8]) -> Result<Self, CryptoError> {
        if session_key.len() != KEY_LEN_32 {
            return Err(CryptoError::InvalidKeyLen {
                expected: KEY_LEN_32,
                actual: session_key.len(),
            });
        }

        let bad_key = || CryptoError::InvalidKeyLen {
            expected: KEY_LEN_32,
            actual: session_key.len(),
        };

        match header.cipher {
            cipher_ids::AES256_GCM => Ok(Self::AesGcm(
                Aes256Gcm::new_from_slice(session_key).map_err(|_| bad_key())?,
            )),
            cipher_ids::CHACHA20_POLY1305 => Ok(Self::ChaCha(
                ChaCha20Poly1305::new_from_slice(session_key).map_err(|_| bad_key())?,
            )),
            other => Err(CryptoError::UnsupportedCipher { cipher_id: other }),
        }
    }

    /// Seal (encrypt) plaintext with nonce and AAD. Output is ciphertext followed by the tag.
    pub fn seal(&self, nonce_12: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_nonce(nonce_12)?;

        match self {
            AeadImpl::AesGcm(cipher) => cipher
                .encrypt(AesNonce::from_slice(nonce_12), Payload { msg: plaintext, aad })
                .map_err(|_| CryptoError::Failure("AES-GCM seal failed".into())),
            AeadImpl::ChaCha(cipher) => cipher
                .encrypt(ChaNonce::from_slice(nonce_12), Payload { msg: plaintext, aad })
                .map_err(|_| CryptoError::Failure("ChaCha20-Poly1305 seal failed".into())),
        }
    }

    /// Open (decrypt) ciphertext-and-tag with nonce and AAD.
    pub fn open(&self, nonce_12: &[u8], aad: &[u8], ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        check_nonce(nonce_12)?;

        if ciphertext_and_tag.len() < TAG_LEN {
            return Err(CryptoError::Failure("ciphertext too short".into()));
        }

        match self {
            AeadImpl::AesGcm(cipher) => cipher
                .decrypt(AesNonce::from_slice(nonce_12), Payload { msg: ciphertext_and_tag, aad })
                .map_err(|_| CryptoError::TagMismatch),
            AeadImpl::ChaCha(cipher) => cipher
                .decrypt(ChaNonce::from_slice(nonce_12), Payload { msg: ciphertext_and_tag, aad })
                .map_err(|_| CryptoError::TagMismatch),
        }
    }
}

fn check_nonce(nonce_12: &[u8]) -> Result<(), CryptoError> {
    if nonce_12.len() != NONCE_LEN_12 {
        return Err(CryptoError::InvalidNonceLen {
            expected: NONCE_LEN_12,
            actual: nonce_12.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::CipherSuite;

    fn roundtrip(cipher: CipherSuite) {
        let header = EnvelopeHeader::new_with_salt([7; 16]).with_cipher(cipher);
        let aead = AeadImpl::from_header_and_key(&header, &[3u8; 32]).unwrap();
        let nonce = [9u8; 12];

        let sealed = aead.seal(&nonce, b"aad", b"payload").unwrap();
        assert_eq!(sealed.len(), b"payload".len() + TAG_LEN);
        assert_eq!(aead.open(&nonce, b"aad", &sealed).unwrap(), b"payload");

        let err = aead.open(&nonce, b"other", &sealed).unwrap_err();
        assert!(matches!(err, CryptoError::TagMismatch));
    }

    #[test]
    fn aes_gcm_seal_open() {
        roundtrip(CipherSuite::Aes256Gcm);
    }

    #[test]
    fn chacha_seal_open() {
        roundtrip(CipherSuite::Chacha20Poly1305);
    }

    #[test]
    fn rejects_short_key_and_nonce() {
        let header = EnvelopeHeader::default();
        assert!(matches!(
            AeadImpl::from_header_and_key(&header, &[0u8; 16]),
            Err(CryptoError::InvalidKeyLen { expected: 32, actual: 16 })
        ));

        let aead = AeadImpl::from_header_and_key(&header, &[0u8; 32]).unwrap();
        assert!(matches!(
            aead.seal(&[0u8; 8], b"", b"x"),
            Err(CryptoError::InvalidNonceLen { .. })
        ));
    }
}
