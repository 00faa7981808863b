// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! In-memory flash model for host testing
//!
//! Models NOR flash semantics: erased cells read 0xFF, programming can
//! only clear bits, and erase works on whole pages. An optional write
//! budget lets tests simulate power loss mid-install.

use crate::error::{HalError, HalResult};
use crate::traits::{FlashInterface, ResetInterface, WatchdogInterface};

/// Byte value of an erased flash cell
pub const ERASED: u8 = 0xFF;

/// Simulated flash region
///
/// `SIZE` is the region length in bytes, `PAGE` the erase page size.
/// The region is mapped at `base`.
pub struct SimFlash<const SIZE: usize, const PAGE: usize = 1024> {
    base: u32,
    mem: [u8; SIZE],
    write_budget: Option<usize>,
}

impl<const SIZE: usize, const PAGE: usize> SimFlash<SIZE, PAGE> {
    /// Create a fully erased region mapped at `base`
    #[must_use]
    pub const fn new(base: u32) -> Self {
        Self {
            base,
            mem: [ERASED; SIZE],
            write_budget: None,
        }
    }

    /// Limit the number of bytes that may still be programmed
    ///
    /// Once the budget is exhausted, writes fail with
    /// [`HalError::FlashWriteFailed`], leaving everything written so far
    /// in place. Pass `None` to remove the limit.
    pub fn set_write_budget(&mut self, budget: Option<usize>) {
        self.write_budget = budget;
    }

    /// Direct view of the backing memory
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.mem
    }

    /// Corrupt a single byte, as a stuck or flipped cell would
    ///
    /// # Panics
    ///
    /// Panics if `address` is outside the region.
    pub fn corrupt(&mut self, address: u32, xor: u8) {
        let offset = (address - self.base) as usize;
        self.mem[offset] ^= xor;
    }

    fn offset_of(&self, address: u32, len: usize) -> HalResult<usize> {
        let offset = address
            .checked_sub(self.base)
            .ok_or(HalError::FlashOutOfBounds)? as usize;
        if offset + len > SIZE {
            return Err(HalError::FlashOutOfBounds);
        }
        Ok(offset)
    }
}

impl<const SIZE: usize, const PAGE: usize> FlashInterface for SimFlash<SIZE, PAGE> {
    const PAGE_SIZE: u32 = PAGE as u32;

    fn read(&self, address: u32, buf: &mut [u8]) -> HalResult<()> {
        let offset = self.offset_of(address, buf.len())?;
        buf.copy_from_slice(&self.mem[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> HalResult<()> {
        let offset = self.offset_of(address, data.len())?;
        for (i, &byte) in data.iter().enumerate() {
            if let Some(budget) = self.write_budget {
                if budget == 0 {
                    return Err(HalError::FlashWriteFailed);
                }
                self.write_budget = Some(budget - 1);
            }
            let cell = &mut self.mem[offset + i];
            // programming can only clear bits
            if *cell & byte != byte {
                return Err(HalError::FlashWriteFailed);
            }
            *cell = byte;
        }
        Ok(())
    }

    fn erase_page(&mut self, address: u32) -> HalResult<()> {
        let offset = self.offset_of(address, 1)?;
        let page_start = offset - (offset % PAGE);
        self.mem[page_start..page_start + PAGE].fill(ERASED);
        Ok(())
    }
}

/// Simulated watchdog recording feeds and a reset flag
#[derive(Debug, Default)]
pub struct SimWatchdog {
    /// Whether the last reset was a watchdog reset
    pub reset_flag: bool,
    /// Number of times the watchdog was fed
    pub feed_count: u32,
    /// Configured timeout, if initialized
    pub timeout_ms: Option<u32>,
}

impl WatchdogInterface for SimWatchdog {
    fn init(&mut self, timeout_ms: u32) {
        self.timeout_ms = Some(timeout_ms);
    }

    fn feed(&mut self) {
        self.feed_count += 1;
    }

    fn was_watchdog_reset(&self) -> bool {
        self.reset_flag
    }

    fn clear_reset_flags(&mut self) {
        self.reset_flag = false;
    }
}

/// Simulated reset that panics instead of resetting
///
/// Tests asserting that a path resets catch the panic message.
#[derive(Debug, Default)]
pub struct SimReset;

impl ResetInterface for SimReset {
    fn soft_reset(&mut self) -> ! {
        panic!("soft reset requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Flash = SimFlash<4096, 1024>;
    const BASE: u32 = 0x0800_0000;

    #[test]
    fn starts_erased() {
        let flash = Flash::new(BASE);
        let mut buf = [0u8; 16];
        flash.read(BASE + 100, &mut buf).unwrap();
        assert_eq!(buf, [ERASED; 16]);
    }

    #[test]
    fn write_then_read_back() {
        let mut flash = Flash::new(BASE);
        flash.write(BASE + 8, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 4];
        flash.read(BASE + 8, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn overwrite_without_erase_fails() {
        let mut flash = Flash::new(BASE);
        flash.write(BASE, &[0x00]).unwrap();
        assert_eq!(flash.write(BASE, &[0x01]), Err(HalError::FlashWriteFailed));
        flash.erase_page(BASE).unwrap();
        flash.write(BASE, &[0x01]).unwrap();
    }

    #[test]
    fn erase_range_covers_partial_pages() {
        let mut flash = Flash::new(BASE);
        flash.write(BASE + 1020, &[0u8; 8]).unwrap();
        flash.erase_range(BASE + 1023, 2).unwrap();
        let mut buf = [0u8; 8];
        flash.read(BASE + 1020, &mut buf).unwrap();
        // both touched pages erased
        assert_eq!(buf, [ERASED; 8]);
    }

    #[test]
    fn out_of_bounds_rejected() {
        let flash = Flash::new(BASE);
        let mut buf = [0u8; 8];
        assert_eq!(
            flash.read(BASE + 4092, &mut buf),
            Err(HalError::FlashOutOfBounds)
        );
        assert_eq!(
            flash.read(BASE - 4, &mut buf[..1]),
            Err(HalError::FlashOutOfBounds)
        );
    }

    #[test]
    fn verify_detects_mismatch() {
        let mut flash = Flash::new(BASE);
        flash.write(BASE, &[1, 2, 3, 4]).unwrap();
        assert!(flash.verify(BASE, &[1, 2, 3, 4]).is_ok());
        assert_eq!(
            flash.verify(BASE, &[1, 2, 3, 5]),
            Err(HalError::FlashWriteFailed)
        );
    }

    #[test]
    fn write_budget_cuts_power() {
        let mut flash = Flash::new(BASE);
        flash.set_write_budget(Some(6));
        assert_eq!(
            flash.write(BASE, &[0xAA; 10]),
            Err(HalError::FlashWriteFailed)
        );
        let mut buf = [0u8; 10];
        flash.read(BASE, &mut buf).unwrap();
        // first six bytes landed, the rest stayed erased
        assert_eq!(&buf[..6], &[0xAA; 6]);
        assert_eq!(&buf[6..], &[ERASED; 4]);
    }
}
