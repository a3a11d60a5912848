//! headers/mod.rs
//! Envelope header for encrypted record streams.
//!
//! - Fixed-size header (48 bytes) enables deterministic IO.
//! - Explicit registry ids (cipher, PRF) avoid silent incompatibilities.
//! - The encoded header is bound into every frame's AAD.

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::*;
pub use decode::*;
