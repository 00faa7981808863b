// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Cortex-M boot transfer
//!
//! Hands control to a firmware image laid out with a standard ARMv7-M
//! vector table: word 0 holds the initial stack pointer, word 1 the
//! reset handler address.

use crate::traits::BootTransfer;

/// [`BootTransfer`] implementation for Cortex-M targets
///
/// On non-ARM builds (host tests) `transfer` parks in an infinite loop
/// instead of jumping.
#[derive(Debug, Default)]
pub struct CortexMTransfer;

impl CortexMTransfer {
    /// Create a transfer handle
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BootTransfer for CortexMTransfer {
    #[cfg(target_arch = "arm")]
    fn transfer(&mut self, vector_address: u32) -> ! {
        unsafe {
            core::arch::asm!("cpsid i");

            let vectors = vector_address as *const u32;
            let stack_pointer = core::ptr::read_volatile(vectors);
            let reset_handler = core::ptr::read_volatile(vectors.add(1));

            // Re-point VTOR before the image starts taking interrupts
            const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
            core::ptr::write_volatile(SCB_VTOR, vector_address);

            core::arch::asm!("dsb", "isb");
            core::arch::asm!("msr msp, {sp}", sp = in(reg) stack_pointer);

            let entry: extern "C" fn() -> ! = core::mem::transmute(reset_handler);
            entry()
        }
    }

    #[cfg(not(target_arch = "arm"))]
    fn transfer(&mut self, _vector_address: u32) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}
