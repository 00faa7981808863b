// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Slot selection and reconciliation

use ota_common::Result;
use ota_crypto::{BoxPublicKey, BoxSecretKey};
use ota_file::staged_file_version;
use ota_hal::{BootTransfer, FlashInterface, WatchdogInterface};
use ota_slots::SlotRegistry;

/// Outcome of the boot decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootDecision {
    /// Hand control to the verified image in `slot`
    Boot {
        /// Slot the image was verified in
        slot: u8,
        /// Absolute address of its vector table
        vector_address: u32,
    },
    /// Nothing bootable; park in the safe state
    SafeState,
}

/// Decide what to boot, reconciling interrupted installs on the way
///
/// Consumes the watchdog reset flag: it is read once and cleared so the
/// next boot starts clean. May erase a half-installed slot or a staged
/// update file implicated in a watchdog boot loop.
///
/// # Errors
///
/// Returns [`ota_common::Error::FlashIo`] on a flash failure; callers
/// treat that as nothing bootable.
pub fn decide<F, W>(
    registry: &mut SlotRegistry<F>,
    watchdog: &mut W,
    server_pk: &BoxPublicKey,
    device_sk: &BoxSecretKey,
) -> Result<BootDecision>
where
    F: FlashInterface,
    W: WatchdogInterface,
{
    let wdg_reset = watchdog.was_watchdog_reset();
    watchdog.clear_reset_flags();

    let Some(newest) = registry.find_newest()? else {
        return Ok(BootDecision::SafeState);
    };
    let oldest = registry.find_oldest()?.unwrap_or(newest);

    if newest == oldest {
        // a single candidate: boot it or give up
        if wdg_reset {
            return Ok(BootDecision::SafeState);
        }
        if registry.verify_slot(newest, server_pk, device_sk).is_ok() {
            return boot(registry, newest);
        }
        return Ok(BootDecision::SafeState);
    }

    if wdg_reset {
        // the newest image hung after boot; if the staged file is the
        // one that produced it, drop the file to break the loop
        if staged_version_covers(registry, newest)? {
            let layout = *registry.layout();
            registry
                .flash_mut()
                .erase_range(layout.staging_base, layout.staging_size)?;
        }
    } else {
        if registry.verify_slot(newest, server_pk, device_sk).is_ok() {
            return boot(registry, newest);
        }
        // newest does not verify: an interrupted installation leaves a
        // staged file at least as new as the slot it was writing
        if staged_version_covers(registry, newest)? {
            registry.erase_slot(newest)?;
        }
        // anything else is corruption; leave the slot for diagnosis
    }

    // fall back to the oldest remaining image
    let Some(fallback) = registry.find_oldest()? else {
        return Ok(BootDecision::SafeState);
    };
    if registry.verify_slot(fallback, server_pk, device_sk).is_ok() {
        return boot(registry, fallback);
    }
    Ok(BootDecision::SafeState)
}

/// Whether a staged file exists whose version does not exceed `slot`'s
fn staged_version_covers<F: FlashInterface>(
    registry: &SlotRegistry<F>,
    slot: u8,
) -> Result<bool> {
    let slot_version = match registry.slot_metadata(slot)? {
        Some(meta) => meta.version,
        None => return Ok(false),
    };
    match staged_file_version(registry.flash(), registry.layout())? {
        Some(file_version) => Ok(file_version <= slot_version),
        None => Ok(false),
    }
}

fn boot<F: FlashInterface>(registry: &SlotRegistry<F>, slot: u8) -> Result<BootDecision> {
    Ok(BootDecision::Boot {
        slot,
        vector_address: registry.layout().vector_address(slot)?,
    })
}

/// Boot the device: decide, then transfer or park
///
/// Flash failures during the decision are treated as nothing bootable.
pub fn run<F, W, T>(
    registry: &mut SlotRegistry<F>,
    watchdog: &mut W,
    transfer: &mut T,
    server_pk: &BoxPublicKey,
    device_sk: &BoxSecretKey,
) -> !
where
    F: FlashInterface,
    W: WatchdogInterface,
    T: BootTransfer,
{
    match decide(registry, watchdog, server_pk, device_sk) {
        Ok(BootDecision::Boot {
            vector_address, ..
        }) => transfer.transfer(vector_address),
        Ok(BootDecision::SafeState) | Err(_) => crate::safe::safe_state(watchdog),
    }
}
