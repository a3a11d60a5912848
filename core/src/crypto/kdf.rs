//! crypto/kdf.rs
//! HKDF-based session key derivation from master key and header salt.
//!
//! - HKDF-Extract(master_key, salt) -> PRK
//! - HKDF-Expand(PRK, info) -> session key (32 bytes)
//!
//! The master key is never used for AEAD directly.

use hkdf::Hkdf;
use sha2::{Sha256, Sha512};

use crate::constants::{prf_ids, MASTER_KEY_LENGTHS};
use crate::crypto::types::{CryptoError, KEY_LEN_32};
use crate::headers::EnvelopeHeader;

/// HKDF 'info' binding the envelope identity: magic, version, cipher, PRF,
/// chunk size and key id.
fn build_info_from_header(header: &EnvelopeHeader) -> Vec<u8> {
    let mut info = Vec::with_capacity(32);
    info.extend_from_slice(&header.magic);
    info.extend_from_slice(&header.version.to_le_bytes());
    info.extend_from_slice(&header.cipher.to_le_bytes());
    info.extend_from_slice(&header.hkdf_prf.to_le_bytes());
    info.extend_from_slice(&header.chunk_size.to_le_bytes());
    info.extend_from_slice(&header.key_id.to_le_bytes());
    info
}

/// Derive a 32-byte per-stream session key from `master_key` and `header.salt`.
///
/// Errors:
/// - master key of unsupported length → `InvalidKeyLen`
/// - all-zero salt → `Failure`
/// - unknown PRF id → `UnsupportedPrf`
pub fn derive_session_key_32(
    master_key: &[u8],
    header: &EnvelopeHeader,
) -> Result<[u8; KEY_LEN_32], CryptoError> {
    if !MASTER_KEY_LENGTHS.contains(&master_key.len()) {
        return Err(CryptoError::InvalidKeyLen { expected: KEY_LEN_32, actual: master_key.len() });
    }
    if header.salt.iter().all(|&b| b == 0) {
        return Err(CryptoError::Failure("salt must not be all-zero".into()));
    }

    let info = build_info_from_header(header);
    let mut key = [0u8; KEY_LEN_32];

    match header.hkdf_prf {
        prf_ids::SHA256 => {
            Hkdf::<Sha256>::new(Some(&header.salt), master_key)
                .expand(&info, &mut key)
                .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-256)".into()))?;
        }
        prf_ids::SHA512 => {
            Hkdf::<Sha512>::new(Some(&header.salt), master_key)
                .expand(&info, &mut key)
                .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-512)".into()))?;
        }
        prf_ids::BLAKE3K => {
            let mut extract = blake3::Hasher::new();
            extract.update(b"RIE1|HKDF|EXTRACT");
            extract.update(master_key);
            extract.update(&header.salt);
            let prk = extract.finalize();

            let mut expand = blake3::Hasher::new_keyed(prk.as_bytes());
            expand.update(b"RIE1|HKDF|EXPAND");
            expand.update(&info);
            key.copy_from_slice(&expand.finalize().as_bytes()[..KEY_LEN_32]);
        }
        other => return Err(CryptoError::UnsupportedPrf { prf_id: other }),
    }

    Ok(key)
}
