// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Boot-time decision state machine
//!
//! Runs before any untrusted image: picks a slot, verifies it, and
//! hands control over. Because installation is not atomic across power
//! loss, this is also where a half-written slot is reconciled:
//!
//! - a failing newest slot whose version matches the staged update file
//!   is an interrupted installation and is erased, so the update can be
//!   retried from the staged file
//! - a failing slot with no matching staged file is corruption and is
//!   left in place for diagnosis
//! - after a watchdog reset, a staged file that produced the newest
//!   slot is erased instead, breaking install-and-hang boot loops
//!
//! When nothing bootable remains the device parks in a safe state that
//! keeps the watchdog fed.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod decision;
pub mod safe;

pub use decision::{decide, run, BootDecision};
pub use safe::safe_state;
