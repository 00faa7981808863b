// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Safe state

use ota_hal::WatchdogInterface;

/// Park the device with no bootable image
///
/// Keeps the watchdog fed so the device idles instead of reset-looping;
/// recovery requires physical access or a fresh staged update on next
/// power cycle.
pub fn safe_state<W: WatchdogInterface>(watchdog: &mut W) -> ! {
    loop {
        watchdog.feed();
        core::hint::spin_loop();
    }
}
