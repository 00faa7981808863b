// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Slot registry
//!
//! Owns the flash handle and the layout and answers every slot query the
//! update and boot paths need. All version ordering uses strict
//! comparisons while scanning slots in ascending order, so ties resolve
//! to the lowest slot index.

use core::fmt;

use ota_common::{Error, Result, SlotLayout};
use ota_hal::FlashInterface;

use crate::metadata::{FirmwareMetadata, METADATA_LEN};

/// Firmware slot registry
pub struct SlotRegistry<F: FlashInterface> {
    flash: F,
    layout: SlotLayout,
}

impl<F: FlashInterface> SlotRegistry<F> {
    /// Create a registry over a flash handle and a layout
    pub const fn new(flash: F, layout: SlotLayout) -> Self {
        Self { flash, layout }
    }

    /// The configured layout
    #[must_use]
    pub const fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    /// Borrow the flash handle
    pub const fn flash(&self) -> &F {
        &self.flash
    }

    /// Mutably borrow the flash handle
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Read and parse the metadata record of a slot
    ///
    /// Returns `Ok(None)` for an empty slot (fully erased metadata area
    /// or an unrecognized magic).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] for an unmanaged index or
    /// [`Error::FlashIo`] on a read failure.
    pub fn slot_metadata(&self, slot: u8) -> Result<Option<FirmwareMetadata>> {
        let address = self.layout.metadata_address(slot)?;
        let mut buf = [0u8; METADATA_LEN];
        self.flash.read(address, &mut buf)?;
        if !FirmwareMetadata::validate_bytes(&buf) {
            return Ok(None);
        }
        Ok(Some(FirmwareMetadata::from_bytes(&buf)?))
    }

    /// Erase page index containing the start of a slot
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] for an unmanaged index.
    pub fn slot_page(&self, slot: u8) -> Result<u32> {
        Ok(self.layout.slot_address(slot)? / F::PAGE_SIZE)
    }

    /// Find the populated slot with the highest firmware version
    ///
    /// Returns `Ok(None)` when no slot is populated. Ties resolve to the
    /// lowest slot index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlashIo`] on a read failure.
    pub fn find_newest(&self) -> Result<Option<u8>> {
        let mut best: Option<(u8, u16)> = None;
        for slot in 1..=self.layout.slot_count {
            if let Some(meta) = self.slot_metadata(slot)? {
                match best {
                    Some((_, version)) if meta.version <= version => {}
                    _ => best = Some((slot, meta.version)),
                }
            }
        }
        Ok(best.map(|(slot, _)| slot))
    }

    /// Find the populated slot with the lowest firmware version
    ///
    /// Returns `Ok(None)` when no slot is populated. Ties resolve to the
    /// lowest slot index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlashIo`] on a read failure.
    pub fn find_oldest(&self) -> Result<Option<u8>> {
        let mut best: Option<(u8, u16)> = None;
        for slot in 1..=self.layout.slot_count {
            if let Some(meta) = self.slot_metadata(slot)? {
                match best {
                    Some((_, version)) if meta.version >= version => {}
                    _ => best = Some((slot, meta.version)),
                }
            }
        }
        Ok(best.map(|(slot, _)| slot))
    }

    /// Find a slot to install into
    ///
    /// Prefers the first empty slot; when every slot is populated, the
    /// one holding the oldest version is offered for eviction. Callers
    /// must not install over the slot the running image was booted from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] if the layout manages no slots and
    /// [`Error::FlashIo`] on a read failure.
    pub fn find_empty(&self) -> Result<u8> {
        for slot in 1..=self.layout.slot_count {
            if self.slot_metadata(slot)?.is_none() {
                return Ok(slot);
            }
        }
        self.find_oldest()?.ok_or(Error::Exhausted)
    }

    /// Find the populated slot holding exactly `version`
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlashIo`] on a read failure.
    pub fn find_matching(&self, version: u16) -> Result<Option<u8>> {
        for slot in 1..=self.layout.slot_count {
            if let Some(meta) = self.slot_metadata(slot)? {
                if meta.version == version {
                    return Ok(Some(slot));
                }
            }
        }
        Ok(None)
    }

    /// Erase a managed slot completely
    ///
    /// Slot 0 (the golden image) is not managed and cannot be erased.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] for an unmanaged index or
    /// [`Error::FlashIo`] on an erase failure.
    pub fn erase_slot(&mut self, slot: u8) -> Result<()> {
        let address = self.layout.slot_address(slot)?;
        self.flash.erase_range(address, self.layout.slot_size)?;
        Ok(())
    }

    /// Displayable listing of every managed slot
    ///
    /// Intended for boot banners and debug consoles.
    #[must_use]
    pub const fn overview(&self) -> SlotOverview<'_, F> {
        SlotOverview { registry: self }
    }

    /// Version of the currently running firmware
    ///
    /// The golden image reports version 0, as does a running slot whose
    /// metadata cannot be read. Anti-rollback compares candidate
    /// versions against this value.
    #[must_use]
    pub fn running_version(&self) -> u16 {
        if self.layout.running_slot == 0 {
            return 0;
        }
        match self.slot_metadata(self.layout.running_slot) {
            Ok(Some(meta)) => meta.version,
            _ => 0,
        }
    }
}

/// Display adapter listing slot states
pub struct SlotOverview<'a, F: FlashInterface> {
    registry: &'a SlotRegistry<F>,
}

impl<F: FlashInterface> fmt::Display for SlotOverview<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in 1..=self.registry.layout.slot_count {
            match self.registry.slot_metadata(slot) {
                Ok(Some(meta)) => writeln!(f, "slot {slot}: {meta}")?,
                Ok(None) => writeln!(f, "slot {slot}: empty")?,
                Err(_) => writeln!(f, "slot {slot}: unreadable")?,
            }
        }
        Ok(())
    }
}
