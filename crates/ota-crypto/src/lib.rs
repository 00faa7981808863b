// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Cryptographic primitives for the OTA trust chain
//!
//! Thin wrappers around audited RustCrypto implementations, exposing
//! exactly the operations the update path needs:
//!
//! - Streaming SHA-256 for firmware images larger than RAM
//! - Authenticated key-exchange "sealed boxes" (X25519 + ChaCha20-Poly1305)
//!   carrying the signature envelopes of update files and installed slots
//! - AES-128-CBC block streaming for decrypting update bodies chunk by
//!   chunk during installation
//!
//! # Security
//!
//! - All comparisons of digests use constant-time equality
//! - Secret key and chaining state types zeroize on drop
//! - No heap allocations

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cbc;
pub mod error;
pub mod hash;
pub mod sealed;

pub use cbc::{CbcDecryptor, CbcEncryptor, AES_BLOCK_LEN, AES_KEY_LEN};
pub use error::{CryptoError, CryptoResult};
pub use hash::{constant_time_eq, sha256, Sha256Digest, StreamingSha256, DIGEST_LEN};
pub use sealed::{open, seal, sealed_len, BoxPublicKey, BoxSecretKey, NONCE_LEN, TAG_LEN};
