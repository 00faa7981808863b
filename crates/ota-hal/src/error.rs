// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL-specific error type

use core::fmt;
use ota_common::Error;

/// Result type for HAL operations
pub type HalResult<T> = core::result::Result<T, HalError>;

/// Errors raised by platform drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HalError {
    /// Address or length falls outside the flash region
    FlashOutOfBounds,
    /// Erase operation failed
    FlashEraseFailed,
    /// Write operation failed or target was not erased
    FlashWriteFailed,
    /// Read operation failed
    FlashReadFailed,
    /// Invalid parameter (misaligned address, zero length)
    InvalidParameter,
    /// Peripheral not initialized
    NotInitialized,
}

impl HalError {
    /// Short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::FlashOutOfBounds => "flash address out of bounds",
            Self::FlashEraseFailed => "flash erase failed",
            Self::FlashWriteFailed => "flash write failed",
            Self::FlashReadFailed => "flash read failed",
            Self::InvalidParameter => "invalid parameter",
            Self::NotInitialized => "peripheral not initialized",
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<HalError> for Error {
    fn from(err: HalError) -> Self {
        match err {
            HalError::FlashOutOfBounds
            | HalError::FlashEraseFailed
            | HalError::FlashWriteFailed
            | HalError::FlashReadFailed => Self::FlashIo,
            HalError::InvalidParameter => Self::InvalidParameter,
            HalError::NotInitialized => Self::InvalidState,
        }
    }
}
