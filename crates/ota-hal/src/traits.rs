// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hardware abstraction traits

use crate::error::{HalError, HalResult};

/// Internal flash with page-granular erase
///
/// Addresses are absolute flash addresses. Implementations may impose
/// alignment requirements on writes; the update path only writes at
/// offsets aligned to its own chunk size.
pub trait FlashInterface {
    /// Erase page size in bytes
    const PAGE_SIZE: u32;

    /// Read `buf.len()` bytes starting at `address`
    ///
    /// # Errors
    ///
    /// Returns a [`HalError`] if the range is out of bounds or the read
    /// fails.
    fn read(&self, address: u32, buf: &mut [u8]) -> HalResult<()>;

    /// Program `data` starting at `address`
    ///
    /// The target range must have been erased. Flash cells only clear
    /// bits, so writing over non-erased cells is an error.
    ///
    /// # Errors
    ///
    /// Returns a [`HalError`] if the range is out of bounds, not erased,
    /// or the program operation fails.
    fn write(&mut self, address: u32, data: &[u8]) -> HalResult<()>;

    /// Erase the page containing `address`
    ///
    /// # Errors
    ///
    /// Returns a [`HalError`] if the address is out of bounds or the
    /// erase fails.
    fn erase_page(&mut self, address: u32) -> HalResult<()>;

    /// Erase every page overlapping `[address, address + length)`
    ///
    /// # Errors
    ///
    /// Returns a [`HalError`] from the first failing page erase.
    fn erase_range(&mut self, address: u32, length: u32) -> HalResult<()> {
        if length == 0 {
            return Err(HalError::InvalidParameter);
        }
        let first = address - (address % Self::PAGE_SIZE);
        let last = address + length - 1;
        let mut page = first;
        loop {
            self.erase_page(page)?;
            if last - page < Self::PAGE_SIZE {
                break;
            }
            page += Self::PAGE_SIZE;
        }
        Ok(())
    }

    /// Verify that `data` is stored at `address`
    ///
    /// # Errors
    ///
    /// Returns [`HalError::FlashWriteFailed`] on mismatch or a read
    /// error from the underlying driver.
    fn verify(&self, address: u32, data: &[u8]) -> HalResult<()> {
        let mut buf = [0u8; 64];
        let mut offset = 0usize;
        while offset < data.len() {
            let n = core::cmp::min(64, data.len() - offset);
            self.read(address + offset as u32, &mut buf[..n])?;
            if buf[..n] != data[offset..offset + n] {
                return Err(HalError::FlashWriteFailed);
            }
            offset += n;
        }
        Ok(())
    }
}

/// Independent watchdog
pub trait WatchdogInterface {
    /// Start the watchdog with the given timeout
    fn init(&mut self, timeout_ms: u32);

    /// Reload the watchdog counter
    fn feed(&mut self);

    /// Whether the last reset was caused by the watchdog
    fn was_watchdog_reset(&self) -> bool;

    /// Clear the reset cause flags
    fn clear_reset_flags(&mut self);
}

/// Software reset
pub trait ResetInterface {
    /// Reset the device; does not return
    fn soft_reset(&mut self) -> !;
}

/// One-way handoff to a firmware image
///
/// Transferring control re-points the vector table, loads the image
/// stack pointer and jumps to its reset handler. There is no way back;
/// the bootloader's state is gone once this returns `!`.
pub trait BootTransfer {
    /// Jump to the image whose vector table is at `vector_address`
    fn transfer(&mut self, vector_address: u32) -> !;
}
