//! OKVS Core - Shared primitives for oblivious key-value stores
//!
//! This crate provides:
//! - AES-based keyed PRF for hashing keys to positions and bit vectors
//! - XOR row helpers used by every decoder
//! - GF(2^l) arithmetic with deterministic modulus selection
//! - Gaussian elimination for {0, 1}-coefficient systems over GF(2^l)
//! - Polynomial interpolation and evaluation over GF(2^l)

pub mod error;
pub mod gf2e;
pub mod poly;
pub mod prf;
pub mod solver;
pub mod xor;

pub use error::CoreError;
pub use gf2e::Gf2e;
pub use prf::{Prf, HASH_KEY_BYTES};
pub use solver::{BinaryRow, BinarySystem, SolveOutcome};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Statistical security parameter (bits)
pub const STAT_SEC_PARAM: usize = 40;

/// Round a bit length up to whole bytes
#[inline]
pub fn byte_length(bits: usize) -> usize {
    (bits + 7) / 8
}

/// Round a count up to the next multiple of 8
#[inline]
pub fn round_up_to_byte(bits: usize) -> usize {
    byte_length(bits) * 8
}
