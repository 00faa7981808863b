// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Update file validation and installation
//!
//! An update file arrives over an untrusted channel and is staged in a
//! dedicated flash area. Nothing in it is believed until
//! [`validate_file`] has walked the full gate sequence: structural
//! checks, hardware id, anti-rollback, then the outer signature
//! envelope covering everything that will end up in a slot.
//!
//! Validation yields the body decryption key and IV; [`install`] then
//! streams the body through AES-128-CBC into the target slot in small
//! chunks. Installation is not atomic across power loss; the boot path
//! reconciles a half-written slot using the staged file that produced
//! it.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod install;
pub mod validate;
pub mod wire;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use install::install;
pub use validate::{validate_file, DecryptionMaterial};
pub use wire::{staged_file_version, staged_magic_ok};
