// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Fixed-size identity types
//!
//! Hardware and chip identifiers are stored little-endian in firmware
//! metadata records and compared byte-for-byte against the values the
//! device was provisioned with.

use core::fmt;

/// Length of a hardware identifier in bytes
pub const HARDWARE_ID_LEN: usize = 8;

/// Length of a per-chip identifier in bytes
pub const CHIP_ID_LEN: usize = 16;

/// Hardware family identifier (8 bytes, little-endian)
///
/// Identifies the board family a firmware image was built for. An update
/// whose hardware id does not match the device is rejected before any
/// cryptographic work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareId([u8; HARDWARE_ID_LEN]);

impl HardwareId {
    /// Create from raw bytes
    #[must_use]
    pub const fn new(bytes: [u8; HARDWARE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a numeric id, stored little-endian
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value.to_le_bytes())
    }

    /// Raw bytes, little-endian
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HARDWARE_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Per-chip unique identifier (16 bytes)
///
/// Recorded in firmware metadata for provenance; unlike the hardware id
/// it does not gate installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipId([u8; CHIP_ID_LEN]);

impl ChipId {
    /// Create from raw bytes
    #[must_use]
    pub const fn new(bytes: [u8; CHIP_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHIP_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
