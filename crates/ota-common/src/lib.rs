// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Common types for the OTA firmware update trust chain
//!
//! This crate provides the unified error type, the static slot layout
//! configuration, fixed-size identity types and a small event log shared
//! by every other crate in the workspace.
//!
//! # Features
//!
//! - `defmt`: derive `defmt::Format` on the error type for embedded debugging
//!
//! # Security
//!
//! No heap allocations are performed; all buffers are fixed-size arrays or
//! heapless collections. Key material never passes through this crate.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod errors;
pub mod log;
pub mod types;

pub use config::SlotLayout;
pub use errors::{Error, Result};
pub use types::{ChipId, HardwareId};
