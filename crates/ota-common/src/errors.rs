// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for the OTA trust chain
//!
//! One unified error type is used throughout the update and boot path.
//! All errors are no_std compatible and carry no heap-allocated context.

use core::fmt;

/// Result type alias for OTA operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the OTA trust chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Slot Errors (0x01xx)
    // =========================================================================
    /// Slot index is 0 (reserved for the golden image) or above the maximum
    InvalidSlot,
    /// No empty or evictable slot is available
    Exhausted,

    // =========================================================================
    // Structure Errors (0x02xx)
    // =========================================================================
    /// Magic value, record layout or hardware id check failed
    StructuralMismatch,
    /// Candidate firmware version is not strictly newer than the running one
    RollbackAttempted,

    // =========================================================================
    // Crypto Errors (0x03xx)
    // =========================================================================
    /// Signature envelope failed to authenticate or the digest mismatched
    SignatureInvalid,
    /// A cryptographic primitive failed for a non-authentication reason
    CryptoFailure,

    // =========================================================================
    // Flash Errors (0x04xx)
    // =========================================================================
    /// Underlying flash primitive failed
    FlashIo,

    // =========================================================================
    // General Errors (0xFFxx)
    // =========================================================================
    /// Invalid parameter provided
    InvalidParameter,
    /// Buffer is too small for the operation
    BufferTooSmall,
    /// Operation is not valid in the current state
    InvalidState,
    /// No update is available
    NoUpdateAvailable,
    /// Internal error (should not occur)
    InternalError,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Slot errors
    /// - 0x02xx: Structure errors
    /// - 0x03xx: Crypto errors
    /// - 0x04xx: Flash errors
    /// - 0xFFxx: General errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidSlot => 0x0101,
            Self::Exhausted => 0x0102,

            Self::StructuralMismatch => 0x0201,
            Self::RollbackAttempted => 0x0202,

            Self::SignatureInvalid => 0x0301,
            Self::CryptoFailure => 0x0302,

            Self::FlashIo => 0x0401,

            Self::InvalidParameter => 0xFF01,
            Self::BufferTooSmall => 0xFF02,
            Self::InvalidState => 0xFF03,
            Self::NoUpdateAvailable => 0xFF04,
            Self::InternalError => 0xFFFF,
        }
    }

    /// Check if this is a security-critical error
    ///
    /// Security errors indicate an update file or slot that must not be
    /// trusted; they are never retried automatically.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::StructuralMismatch | Self::RollbackAttempted | Self::SignatureInvalid
        )
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidSlot => "invalid slot index",
            Self::Exhausted => "no slot available",
            Self::StructuralMismatch => "structural mismatch",
            Self::RollbackAttempted => "rollback attempted",
            Self::SignatureInvalid => "signature invalid",
            Self::CryptoFailure => "crypto failure",
            Self::FlashIo => "flash I/O error",
            Self::InvalidParameter => "invalid parameter",
            Self::BufferTooSmall => "buffer too small",
            Self::InvalidState => "invalid state",
            Self::NoUpdateAvailable => "no update available",
            Self::InternalError => "internal error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{=u16:04x}] {}", self.code(), self.description());
    }
}
