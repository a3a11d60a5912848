//! envelope — authenticated, framed encryption around a plaintext byte stream.
//!
//! Layout: `EnvelopeHeader (48 B) | Data frame* | Final frame`.
//! Each frame is `type u8 | index u32 | ct_len u32 | ciphertext+tag`.

pub mod types;
pub mod framing;
pub mod reader;
pub mod writer;

pub use types::*;
pub use framing::*;
pub use reader::DecryptingReader;
pub use writer::{encrypt_to_vec, EncryptingWriter};
