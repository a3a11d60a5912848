/// Magic number for the encrypted record envelope.
/// "RIE1" = Record Ingest Envelope v1
pub const MAGIC_RIE1: [u8; 4] = *b"RIE1";
pub const HEADER_V1: u16 = 1;

/// Default plaintext bytes per envelope frame.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64 KiB
/// Smallest chunk size accepted in an envelope header.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;
/// Largest chunk size accepted; bounds the per-frame buffer of the decrypting reader.
pub const MAX_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Accepted master key lengths (bytes).
pub const MASTER_KEY_LENGTHS: &[usize] = &[32];

/// Members routed to callbacks when no explicit field list is configured.
pub const DEFAULT_FIELDS: &[&str] = &["name", "gender"];

/// Bytes requested from the input stream per read.
pub const DEFAULT_READ_BUFFER: usize = 8 * 1024;
pub const MIN_READ_BUFFER: usize = 64;
pub const MAX_READ_BUFFER: usize = 1024 * 1024;

/// Nesting limit inside one element or one skipped value.
pub const DEFAULT_MAX_DEPTH: usize = 128;
pub const MAX_DEPTH_LIMIT: usize = 1024;

/// Raw bytes of a top-level member name passed to the parser, at least.
pub const MIN_NAME_PREFIX: usize = 256;

/// Bounded channel capacity for the background runner.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Cipher suite identifiers (mirrored in headers).
pub mod cipher_ids {
    pub const AES256_GCM: u16        = 0x0001;
    pub const CHACHA20_POLY1305: u16 = 0x0002;
}

/// HKDF PRF identifiers (mirrored in headers).
pub mod prf_ids {
    pub const SHA256: u16  = 0x0001;
    pub const SHA512: u16  = 0x0002;
    pub const BLAKE3K: u16 = 0x0003; // keyed BLAKE3
}
