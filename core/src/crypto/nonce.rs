//! Deterministic nonce derivation from stream salt and frame index.
//!
//! TLS-style: the first 12 salt bytes form the base IV; bytes 4..12 are
//! XORed with the little-endian frame index. Encrypt and decrypt must use the
//! identical schedule. A (salt, frame_index) pair must never repeat.

use crate::crypto::types::{NonceError, NONCE_LEN_12};

/// Derive the 12-byte AEAD nonce for `frame_index`.
#[inline]
pub fn derive_nonce_12_tls_style(
    salt: &[u8; 16],
    frame_index: u64,
) -> Result<[u8; NONCE_LEN_12], NonceError> {
    validate_salt(salt)?;

    let mut nonce = [0u8; NONCE_LEN_12];
    nonce.copy_from_slice(&salt[..NONCE_LEN_12]);

    let ctr: [u8; 8] = frame_index.to_le_bytes();
    for j in 0..8 {
        nonce[4 + j] ^= ctr[j];
    }

    Ok(nonce)
}

#[inline]
pub fn validate_salt(salt: &[u8; 16]) -> Result<(), NonceError> {
    if salt.iter().all(|&b| b == 0) {
        return Err(NonceError::InvalidSalt);
    }
    Ok(())
}
