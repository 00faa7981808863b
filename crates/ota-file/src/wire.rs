// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Update file wire layout
//!
//! ```text
//! offset   size        field
//! 0x000    8           file magic ("QOTA" "FW01")
//! 0x008    0x80        outer signature envelope space
//! 0x088    0x40        inner signature envelope space
//! 0x0C8    0x40        firmware metadata space
//! 0x108    enc_size    AES-128-CBC encrypted image body
//! ```
//!
//! The outer envelope covers bytes `0x88..0x108 + enc_size`, i.e.
//! everything except the magic and the envelope itself. Bytes
//! `0x8..0x108` are copied verbatim into the slot header during
//! installation; the inner envelope among them re-verifies the
//! installed plaintext image.

use ota_common::{Error, Result, SlotLayout};
use ota_hal::FlashInterface;
use ota_slots::{FirmwareMetadata, METADATA_LEN};

/// First file magic word ("QOTA", little-endian)
pub const FILE_MAGIC_HI: u32 = 0x4154_4F51;

/// Second file magic word ("FW01", little-endian)
pub const FILE_MAGIC_LO: u32 = 0x3130_5746;

/// Offset of the outer signature envelope
pub const OUTER_SIG_OFFSET: u32 = 8;

/// Offset of the inner signature envelope
pub const INNER_SIG_OFFSET: u32 = 0x88;

/// Offset of the metadata space
pub const METADATA_OFFSET: u32 = 0xC8;

/// Offset of the encrypted body
pub const BODY_OFFSET: u32 = 0x108;

/// Encrypted body length for an image of `size` bytes
///
/// The body is padded up to the AES block length on the wire. The size
/// field comes from unauthenticated flash; `None` means padding it
/// would overflow, so the record cannot describe a real body.
#[must_use]
pub const fn encrypted_size(size: u32) -> Option<u32> {
    if size % 16 == 0 {
        Some(size)
    } else {
        size.checked_add(16 - size % 16)
    }
}

/// Check the staged file's magic words
///
/// A cheap structural probe used by the boot path to tell whether the
/// staging area holds anything resembling an update file.
///
/// # Errors
///
/// Returns [`Error::FlashIo`] on a read failure.
pub fn staged_magic_ok<F: FlashInterface>(flash: &F, layout: &SlotLayout) -> Result<bool> {
    let mut buf = [0u8; 8];
    flash.read(layout.staging_base, &mut buf)?;
    let hi = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let lo = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    Ok(hi == FILE_MAGIC_HI && lo == FILE_MAGIC_LO)
}

/// Read the metadata record from the staged file
///
/// # Errors
///
/// Returns [`Error::StructuralMismatch`] if the record does not parse
/// and [`Error::FlashIo`] on a read failure.
pub fn staged_metadata<F: FlashInterface>(
    flash: &F,
    layout: &SlotLayout,
) -> Result<FirmwareMetadata> {
    let mut buf = [0u8; METADATA_LEN];
    flash.read(layout.staging_base + METADATA_OFFSET, &mut buf)?;
    if !FirmwareMetadata::validate_bytes(&buf) {
        return Err(Error::StructuralMismatch);
    }
    FirmwareMetadata::from_bytes(&buf)
}

/// Firmware version carried by the staged file, if one is staged
///
/// Returns `Ok(None)` when the staging area holds no recognizable file.
///
/// # Errors
///
/// Returns [`Error::FlashIo`] on a read failure.
pub fn staged_file_version<F: FlashInterface>(
    flash: &F,
    layout: &SlotLayout,
) -> Result<Option<u16>> {
    if !staged_magic_ok(flash, layout)? {
        return Ok(None);
    }
    match staged_metadata(flash, layout) {
        Ok(meta) => Ok(Some(meta.version)),
        Err(Error::StructuralMismatch) => Ok(None),
        Err(e) => Err(e),
    }
}
