// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Static slot layout configuration
//!
//! The flash map is fixed at build time on real hardware and injected as
//! a value so that host tests can describe a simulated layout. All
//! addresses are absolute flash addresses.

use crate::errors::{Error, Result};
use crate::types::HardwareId;

/// Alignment of a firmware vector table inside a slot
///
/// Each slot begins with a reserved header region; the executable image
/// (and its vector table) starts at this offset from the slot base.
pub const VTOR_ALIGN: u32 = 0x200;

/// Bytes reserved at the end of the slot header for the metadata record
pub const METADATA_SPACE: u32 = 0x40;

/// Bytes reserved in the slot header for the firmware signature envelope
pub const FW_SIGN_SPACE: u32 = 0x40;

/// Combined span of the signature envelope and metadata record
pub const FW_HEADER_SPACE: u32 = FW_SIGN_SPACE + METADATA_SPACE;

/// Bytes reserved in an update file for the outer signature envelope
pub const FILE_SIGN_SPACE: u32 = 0x80;

/// Bytes of an update file header copied verbatim into a slot
///
/// Covers the outer signature space plus the firmware header.
pub const FILE_HEADER_SPACE: u32 = FILE_SIGN_SPACE + FW_HEADER_SPACE;

/// Flash layout of the firmware slots and the staging area
///
/// Slot indices are 1-based; index 0 refers to the golden factory image,
/// which lives outside the managed region and is never erased.
#[derive(Debug, Clone, Copy)]
pub struct SlotLayout {
    /// Base address of slot 1
    pub slot_base: u32,
    /// Size of each slot in bytes
    pub slot_size: u32,
    /// Number of managed slots
    pub slot_count: u8,
    /// Base address of the staging area holding a downloaded update file
    pub staging_base: u32,
    /// Size of the staging area in bytes
    pub staging_size: u32,
    /// Hardware id this device accepts firmware for
    pub hw_id: HardwareId,
    /// Slot the currently running image was booted from (0 = golden)
    pub running_slot: u8,
}

impl SlotLayout {
    /// Check that a slot index refers to a managed slot
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] for index 0 or indices past the
    /// last managed slot.
    pub const fn check_slot(&self, slot: u8) -> Result<()> {
        if slot == 0 || slot > self.slot_count {
            return Err(Error::InvalidSlot);
        }
        Ok(())
    }

    /// Base address of a managed slot
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] for an unmanaged index.
    pub const fn slot_address(&self, slot: u8) -> Result<u32> {
        match self.check_slot(slot) {
            Ok(()) => Ok(self.slot_base + (slot as u32 - 1) * self.slot_size),
            Err(e) => Err(e),
        }
    }

    /// Address of the metadata record inside a slot
    ///
    /// The record sits at the end of the reserved header region, just
    /// below the vector table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] for an unmanaged index.
    pub const fn metadata_address(&self, slot: u8) -> Result<u32> {
        match self.slot_address(slot) {
            Ok(base) => Ok(base + VTOR_ALIGN - METADATA_SPACE),
            Err(e) => Err(e),
        }
    }

    /// Address of the firmware signature envelope inside a slot
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] for an unmanaged index.
    pub const fn signature_address(&self, slot: u8) -> Result<u32> {
        match self.slot_address(slot) {
            Ok(base) => Ok(base + VTOR_ALIGN - METADATA_SPACE - FW_SIGN_SPACE),
            Err(e) => Err(e),
        }
    }

    /// Address of the vector table (image entry) inside a slot
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] for an unmanaged index.
    pub const fn vector_address(&self, slot: u8) -> Result<u32> {
        match self.slot_address(slot) {
            Ok(base) => Ok(base + VTOR_ALIGN),
            Err(e) => Err(e),
        }
    }
}
