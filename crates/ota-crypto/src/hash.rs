// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! SHA-256 hashing
//!
//! Firmware images can exceed available RAM, so the primary interface is
//! a streaming hasher fed from a small flash read buffer.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a SHA-256 digest in bytes
pub const DIGEST_LEN: usize = 32;

/// A SHA-256 digest
pub type Sha256Digest = [u8; DIGEST_LEN];

/// Incremental SHA-256 hasher
///
/// # Example
///
/// ```
/// use ota_crypto::StreamingSha256;
///
/// let mut hasher = StreamingSha256::new();
/// hasher.update(b"chunk one ");
/// hasher.update(b"chunk two");
/// let digest = hasher.finalize();
/// assert_eq!(digest, ota_crypto::sha256(b"chunk one chunk two"));
/// ```
#[derive(Debug)]
pub struct StreamingSha256 {
    inner: Sha256,
}

impl StreamingSha256 {
    /// Start a new hash computation
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Feed a chunk of data
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish and return the digest
    #[must_use]
    pub fn finalize(self) -> Sha256Digest {
        self.inner.finalize().into()
    }
}

impl Default for StreamingSha256 {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot SHA-256
#[must_use]
pub fn sha256(data: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Constant-time byte-slice equality
///
/// Returns `false` for slices of different length without leaking where
/// the contents differ.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA-256("abc"), FIPS 180-2 test vector
    const ABC_DIGEST: Sha256Digest = [
        0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22,
        0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00,
        0x15, 0xad,
    ];

    #[test]
    fn known_vector() {
        assert_eq!(sha256(b"abc"), ABC_DIGEST);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data = [0x5Au8; 3000];
        let mut hasher = StreamingSha256::new();
        for chunk in data.chunks(1024) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finalize(), sha256(&data));
    }

    #[test]
    fn constant_time_eq_behaves() {
        assert!(constant_time_eq(b"same", b"same"));
        assert!(!constant_time_eq(b"same", b"sama"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
