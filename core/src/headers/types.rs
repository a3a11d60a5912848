//! headers/types.rs
//! Envelope header struct, registries and validation.
//!
//! - Fixed 48-byte little-endian layout; the last 4 bytes are a CRC32 of the first 44.
//! - Salt is random per stream and seeds nonce derivation.
//! - Reserved bytes allow future fields without changing size; always zero them.

use std::fmt;
use num_enum::TryFromPrimitive;

use crate::constants::{cipher_ids, prf_ids};
use crate::constants::{DEFAULT_CHUNK_SIZE, HEADER_V1, MAGIC_RIE1, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::utils::{enum_name_or_hex, fmt_bytes};

/// Fixed header size in bytes.
pub const HEADER_LEN_V1: usize = 48;

/// Bytes covered by the header CRC32.
pub const HEADER_CRC_SPAN: usize = HEADER_LEN_V1 - 4;

/// Cipher suites (header registry).
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum CipherSuite {
    Aes256Gcm        = cipher_ids::AES256_GCM,
    Chacha20Poly1305 = cipher_ids::CHACHA20_POLY1305,
}
impl CipherSuite {
    pub fn verify(raw: u16) -> Result<(), HeaderError> {
        Self::try_from_primitive(raw)
            .map(|_| ())
            .map_err(|_| HeaderError::UnknownCipherSuite { raw })
    }
}

/// HKDF PRF choices (header registry).
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum HkdfPrf {
    Sha256  = prf_ids::SHA256,
    Sha512  = prf_ids::SHA512,
    Blake3K = prf_ids::BLAKE3K,
}
impl HkdfPrf {
    pub fn verify(raw: u16) -> Result<(), HeaderError> {
        Self::try_from_primitive(raw)
            .map(|_| ())
            .map_err(|_| HeaderError::UnknownHkdfPrf { raw })
    }
}

/// Stream header written once in front of the encrypted frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub magic: [u8; 4],        // "RIE1"
    pub version: u16,
    pub cipher: u16,           // CipherSuite id
    pub hkdf_prf: u16,         // HkdfPrf id
    pub flags: u16,            // no flags defined in v1; must be zero
    pub chunk_size: u32,       // max plaintext bytes per data frame
    pub salt: [u8; 16],        // nonce base and HKDF salt
    pub key_id: u32,           // master key registry reference
    pub reserved: [u8; 8],     // must be zero
}

impl Default for EnvelopeHeader {
    /// ChaCha20-Poly1305 with HKDF-SHA256 and 64 KiB frames.
    /// The salt is a placeholder; real streams use [`EnvelopeHeader::new_with_salt`].
    fn default() -> Self {
        Self {
            magic: MAGIC_RIE1,
            version: HEADER_V1,
            cipher: CipherSuite::Chacha20Poly1305 as u16,
            hkdf_prf: HkdfPrf::Sha256 as u16,
            flags: 0,
            chunk_size: DEFAULT_CHUNK_SIZE as u32,
            salt: [1u8; 16],
            key_id: 0,
            reserved: [0u8; 8],
        }
    }
}

impl EnvelopeHeader {
    pub const LEN: usize = HEADER_LEN_V1;

    /// Header with a caller-provided random salt, defaults elsewhere.
    pub fn new_with_salt(salt: [u8; 16]) -> Self {
        Self { salt, ..Default::default() }
    }

    /// Header with a fresh random salt.
    pub fn random() -> Self {
        let mut salt = [0u8; 16];
        while salt.iter().all(|&b| b == 0) {
            rand::Rng::fill(&mut rand::thread_rng(), &mut salt);
        }
        Self::new_with_salt(salt)
    }

    pub fn with_cipher(mut self, cipher: CipherSuite) -> Self {
        self.cipher = cipher as u16;
        self
    }

    pub fn with_prf(mut self, prf: HkdfPrf) -> Self {
        self.hkdf_prf = prf as u16;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u32) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.magic != MAGIC_RIE1 {
            return Err(HeaderError::InvalidMagic { have: self.magic, need: MAGIC_RIE1 });
        }
        if self.version != HEADER_V1 {
            return Err(HeaderError::InvalidVersion { have: self.version });
        }

        CipherSuite::verify(self.cipher)?;
        HkdfPrf::verify(self.hkdf_prf)?;

        if self.flags != 0 {
            return Err(HeaderError::UnknownFlags { raw: self.flags });
        }

        let chunk = self.chunk_size as usize;
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk) {
            return Err(HeaderError::InvalidChunkSize {
                have: self.chunk_size,
                min: MIN_CHUNK_SIZE as u32,
                max: MAX_CHUNK_SIZE as u32,
            });
        }

        if self.salt.iter().all(|&b| b == 0) {
            return Err(HeaderError::InvalidSalt { salt: self.salt });
        }

        if self.reserved.iter().any(|&b| b != 0) {
            return Err(HeaderError::ReservedBytesNonZero { reserved: self.reserved });
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum HeaderError {
    /// Buffer too short to contain a header.
    BufferTooShort { have: usize, need: usize },

    /// Invalid magic marker (expected "RIE1").
    InvalidMagic { have: [u8; 4], need: [u8; 4] },

    /// Unsupported version.
    InvalidVersion { have: u16 },

    UnknownCipherSuite { raw: u16 },

    UnknownHkdfPrf { raw: u16 },

    /// Flag bits set that v1 does not define.
    UnknownFlags { raw: u16 },

    InvalidChunkSize { have: u32, min: u32, max: u32 },

    /// Salt is all zeros.
    InvalidSalt { salt: [u8; 16] },

    ReservedBytesNonZero { reserved: [u8; 8] },

    /// Stored CRC32 does not match the header bytes.
    InvalidCrc32 { have: u32, need: u32 },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HeaderError::*;
        match self {
            BufferTooShort { have, need } =>
                write!(f, "header buffer too short: {} < {}", have, need),
            InvalidMagic { have, need } =>
                write!(f, "invalid magic: expected {}, got {}", fmt_bytes(need), fmt_bytes(have)),
            InvalidVersion { have } =>
                write!(f, "invalid version: {}", have),
            UnknownCipherSuite { raw } =>
                write!(f, "unknown cipher suite: {}", enum_name_or_hex::<CipherSuite>(*raw)),
            UnknownHkdfPrf { raw } =>
                write!(f, "unknown HKDF PRF: {}", enum_name_or_hex::<HkdfPrf>(*raw)),
            UnknownFlags { raw } =>
                write!(f, "unknown flags: 0x{:04x}", raw),
            InvalidChunkSize { have, min, max } =>
                write!(f, "invalid chunk_size: {} not in {}..={}", have, min, max),
            InvalidSalt { salt } =>
                write!(f, "invalid salt: all zeros ({})", fmt_bytes(salt)),
            ReservedBytesNonZero { reserved } =>
                write!(f, "reserved bytes must be zero, got {}", fmt_bytes(reserved)),
            InvalidCrc32 { have, need } =>
                write!(f, "header crc32 mismatch: stored 0x{:08x}, computed 0x{:08x}", have, need),
        }
    }
}

impl std::error::Error for HeaderError {}
