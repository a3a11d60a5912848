use thiserror::Error;

use crate::headers::{CipherSuite, HkdfPrf};
use crate::utils::enum_name_or_hex;

/// Session key size for both supported ciphers.
pub const KEY_LEN_32: usize = 32;

/// Nonce length for AES-GCM and ChaCha20-Poly1305.
pub const NONCE_LEN_12: usize = 12;

/// AEAD tag appended to every frame ciphertext.
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum NonceError {
    #[error("invalid salt: all zeros")]
    InvalidSalt,
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("unsupported cipher suite: {}", enum_name_or_hex::<CipherSuite>(*cipher_id))]
    UnsupportedCipher { cipher_id: u16 },

    #[error("unsupported HKDF PRF: {}", enum_name_or_hex::<HkdfPrf>(*prf_id))]
    UnsupportedPrf { prf_id: u16 },

    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLen { expected: usize, actual: usize },

    /// Authentication failed: wrong key, tampered ciphertext or AAD.
    #[error("AEAD tag mismatch")]
    TagMismatch,

    #[error(transparent)]
    Nonce(#[from] NonceError),

    #[error("crypto failure: {0}")]
    Failure(String),
}
