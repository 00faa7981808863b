// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Update transport abstraction
//!
//! The session does not care how bytes arrive; network stacks, serial
//! links and test mocks all implement the same two calls.

use ota_common::Result;

/// Description of an update offered by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Firmware version on offer
    pub version: u16,
    /// Total update file size in bytes
    pub size: u32,
}

/// Byte source for update files
pub trait UpdateTransport {
    /// Ask the server whether something newer than `running_version`
    /// exists
    ///
    /// # Errors
    ///
    /// Transport-specific failures map onto [`ota_common::Error`].
    fn check_for_update(&mut self, running_version: u16) -> Result<Option<UpdateInfo>>;

    /// Read file bytes starting at `offset` into `buf`
    ///
    /// Returns the number of bytes read; 0 signals end of file.
    ///
    /// # Errors
    ///
    /// Transport-specific failures map onto [`ota_common::Error`].
    fn read_chunk(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize>;
}
