//! Secure random source backed by the operating system generator.

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

use crate::base32;

/// Fills `buf` with cryptographically secure random bytes.
///
/// Panics only if the operating system generator is unavailable, which
/// leaves the process with no safe way to continue.
pub fn fill(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    fill(&mut buf);
    buf
}

/// Uniform value in `[0, max)`; `0` when `max` is `0`.
pub fn random_u32(max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    OsRng.gen_range(0..max)
}

/// Uniform value in `[0, max)`; `0` when `max` is `0`.
pub fn random_u64(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    OsRng.gen_range(0..max)
}

/// Base32 text of `n_bytes` random bytes.
pub fn random_token(n_bytes: usize) -> String {
    base32::encode(&random_bytes(n_bytes))
}
