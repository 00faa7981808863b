// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Application-side update session
//!
//! Runs inside the installed firmware, not the bootloader. Drives the
//! update lifecycle over a pluggable transport:
//!
//! 1. [`UpdateSession::request_update`]: notice an interrupted install
//!    left in the staging area, or ask the server for a newer version
//! 2. [`UpdateSession::download`]: stream the file into staging
//! 3. [`UpdateSession::install`]: validate and install into a free slot
//! 4. [`UpdateSession::reboot`]: hand the result to the bootloader
//!
//! The staged file is kept after installation; the bootloader needs it
//! to classify a failure if the new image does not come up.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod session;
pub mod transport;

pub use session::{RequestOutcome, UpdateSession, UpdateStatus};
pub use transport::{UpdateInfo, UpdateTransport};
