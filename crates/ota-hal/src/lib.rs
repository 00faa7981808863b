// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Platform abstraction for the OTA trust chain
//!
//! Defines the hardware traits the update and boot code is written
//! against:
//!
//! - [`FlashInterface`]: page-erased internal flash
//! - [`WatchdogInterface`]: independent watchdog and its reset flag
//! - [`ResetInterface`]: software reset
//! - [`BootTransfer`]: one-way handoff to a firmware image
//!
//! Board crates implement these traits against their peripherals. The
//! `sim` feature provides [`sim::SimFlash`], an in-memory flash model
//! with NOR-style erase/write semantics for host testing.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[allow(unsafe_code)]
pub mod arm;
pub mod error;
pub mod traits;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use arm::CortexMTransfer;
pub use error::{HalError, HalResult};
pub use traits::{BootTransfer, FlashInterface, ResetInterface, WatchdogInterface};
