// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Crypto-specific error type

use core::fmt;
use ota_common::Error;

/// Result type for crypto operations
pub type CryptoResult<T> = core::result::Result<T, CryptoError>;

/// Errors raised by the crypto primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CryptoError {
    /// Key has an invalid length or is a weak point
    InvalidKey,
    /// Nonce has an invalid length
    InvalidNonce,
    /// Ciphertext is malformed (too short or misaligned)
    InvalidCiphertext,
    /// Authentication tag or digest verification failed
    AuthenticationFailed,
    /// Output buffer is too small
    BufferTooSmall,
    /// Input length violates an alignment requirement
    InvalidLength,
    /// Internal error in an underlying primitive
    InternalError,
}

impl CryptoError {
    /// Short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidKey => "invalid key",
            Self::InvalidNonce => "invalid nonce",
            Self::InvalidCiphertext => "invalid ciphertext",
            Self::AuthenticationFailed => "authentication failed",
            Self::BufferTooSmall => "buffer too small",
            Self::InvalidLength => "invalid length",
            Self::InternalError => "internal crypto error",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::AuthenticationFailed => Self::SignatureInvalid,
            CryptoError::BufferTooSmall => Self::BufferTooSmall,
            CryptoError::InvalidKey
            | CryptoError::InvalidNonce
            | CryptoError::InvalidCiphertext
            | CryptoError::InvalidLength
            | CryptoError::InternalError => Self::CryptoFailure,
        }
    }
}
