// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Firmware slot registry
//!
//! Firmware images live in fixed-size flash slots. Slot indices are
//! 1-based; index 0 names the golden factory image, which is outside the
//! managed region and can never be erased through this crate.
//!
//! A slot is *populated* when its metadata record is present and carries
//! the expected magic value. The registry answers version-ordering
//! queries (newest, oldest, empty, matching) from those records and can
//! verify a populated slot end to end against its embedded signature
//! envelope.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod metadata;
pub mod registry;
pub mod verify;

pub use metadata::{FirmwareMetadata, METADATA_LEN, META_MAGIC};
pub use registry::{SlotOverview, SlotRegistry};
