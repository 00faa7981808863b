// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Firmware metadata records
//!
//! A 40-byte little-endian record stored near the end of a slot header,
//! directly below the vector table. The same record travels inside
//! update files, so the wire layout is fixed.
//!
//! ```text
//! offset  size  field
//! 0x00    4     magic ("QFWM")
//! 0x04    8     hardware id
//! 0x0C    16    chip id
//! 0x1C    2     firmware version
//! 0x1E    2     reserved (zero)
//! 0x20    4     image base address (vector table address)
//! 0x24    4     image size in bytes
//! ```

use core::fmt;
use ota_common::{ChipId, Error, HardwareId, Result};

/// Magic value identifying a firmware metadata record
pub const META_MAGIC: u32 = 0x4D57_4651;

/// Length of a serialized metadata record
pub const METADATA_LEN: usize = 40;

/// Parsed firmware metadata record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareMetadata {
    /// Hardware family the image was built for
    pub hw_id: HardwareId,
    /// Chip the image was produced for
    pub chip_id: ChipId,
    /// Firmware version
    pub version: u16,
    /// Absolute address the image's vector table must end up at
    pub vector_base: u32,
    /// Image size in bytes, excluding the slot header
    pub size: u32,
}

impl FirmwareMetadata {
    /// Parse a record from its wire form
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] on a short buffer and
    /// [`Error::StructuralMismatch`] on a bad magic value.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < METADATA_LEN {
            return Err(Error::BufferTooSmall);
        }
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != META_MAGIC {
            return Err(Error::StructuralMismatch);
        }
        let mut hw = [0u8; 8];
        hw.copy_from_slice(&bytes[4..12]);
        let mut chip = [0u8; 16];
        chip.copy_from_slice(&bytes[12..28]);
        Ok(Self {
            hw_id: HardwareId::new(hw),
            chip_id: ChipId::new(chip),
            version: u16::from_le_bytes([bytes[28], bytes[29]]),
            vector_base: u32::from_le_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]),
            size: u32::from_le_bytes([bytes[36], bytes[37], bytes[38], bytes[39]]),
        })
    }

    /// Serialize the record to its wire form
    #[must_use]
    pub fn to_bytes(&self) -> [u8; METADATA_LEN] {
        let mut out = [0u8; METADATA_LEN];
        out[0..4].copy_from_slice(&META_MAGIC.to_le_bytes());
        out[4..12].copy_from_slice(self.hw_id.as_bytes());
        out[12..28].copy_from_slice(self.chip_id.as_bytes());
        out[28..30].copy_from_slice(&self.version.to_le_bytes());
        out[32..36].copy_from_slice(&self.vector_base.to_le_bytes());
        out[36..40].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    /// Whether raw metadata bytes describe a populated slot
    ///
    /// A slot is populated when its metadata area is not fully erased
    /// and starts with the expected magic value.
    #[must_use]
    pub fn validate_bytes(bytes: &[u8]) -> bool {
        if bytes.len() < METADATA_LEN {
            return false;
        }
        if bytes[..METADATA_LEN].iter().all(|&b| b == 0xFF) {
            return false;
        }
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) == META_MAGIC
    }
}

impl fmt::Display for FirmwareMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fw v{} hw={} base=0x{:08X} size={}",
            self.version, self.hw_id, self.vector_base, self.size
        )
    }
}
