// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Update session state machine

use ota_common::log::EventLog;
use ota_common::{ota_log_error, ota_log_info, ota_log_warn};
use ota_common::{Error, Result};
use ota_crypto::{BoxPublicKey, BoxSecretKey};
use ota_file::{install, validate_file};
use ota_hal::{FlashInterface, ResetInterface};
use ota_slots::SlotRegistry;

use crate::transport::UpdateTransport;

const MODULE: &str = "updater";

/// Download chunk size in bytes
const DOWNLOAD_CHUNK: usize = 256;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Nothing in progress
    Idle,
    /// Server offered a newer version; ready to download
    UpdateAvailable,
    /// Server had nothing newer
    NoUpdate,
    /// A validated update file is already staged from a previous run
    InterruptedUpdate,
    /// File staged and ready to install
    Downloaded,
    /// Last operation failed; see the event log
    Failed,
}

/// What a request round concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A staged file from an interrupted run can be installed directly
    ContinueInstall,
    /// The server offered this version
    UpdateAvailable(u16),
    /// Nothing newer exists
    UpToDate,
}

/// Application-side update session
pub struct UpdateSession<F: FlashInterface, T: UpdateTransport> {
    registry: SlotRegistry<F>,
    transport: T,
    server_pk: BoxPublicKey,
    device_sk: BoxSecretKey,
    status: UpdateStatus,
    pending_size: u32,
    log: EventLog,
}

impl<F: FlashInterface, T: UpdateTransport> UpdateSession<F, T> {
    /// Create an idle session
    pub fn new(
        registry: SlotRegistry<F>,
        transport: T,
        server_pk: BoxPublicKey,
        device_sk: BoxSecretKey,
    ) -> Self {
        Self {
            registry,
            transport,
            server_pk,
            device_sk,
            status: UpdateStatus::Idle,
            pending_size: 0,
            log: EventLog::new(),
        }
    }

    /// Current session state
    #[must_use]
    pub const fn status(&self) -> UpdateStatus {
        self.status
    }

    /// Version of the firmware this session runs inside
    #[must_use]
    pub fn running_version(&self) -> u16 {
        self.registry.running_version()
    }

    /// Recent session events
    #[must_use]
    pub const fn logs(&self) -> &EventLog {
        &self.log
    }

    /// Borrow the slot registry
    pub const fn registry(&self) -> &SlotRegistry<F> {
        &self.registry
    }

    /// Look for an update: a staged leftover first, then the server
    ///
    /// A staged file that still passes full validation means a previous
    /// session was interrupted between download and reboot; it can be
    /// installed without downloading again. The decryption material
    /// recovered during this probe is dropped immediately, validation
    /// runs again at install time.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; flash errors while probing the
    /// staging area.
    pub fn request_update(&mut self) -> Result<RequestOutcome> {
        match validate_file(&self.registry, &self.server_pk, &self.device_sk) {
            Ok(material) => {
                drop(material);
                ota_log_info!(self.log, MODULE, "staged update found, resuming install");
                self.status = UpdateStatus::InterruptedUpdate;
                return Ok(RequestOutcome::ContinueInstall);
            }
            Err(Error::FlashIo) => return Err(Error::FlashIo),
            Err(_) => {}
        }

        let running = self.running_version();
        match self.transport.check_for_update(running)? {
            Some(info) => {
                ota_log_info!(
                    self.log,
                    MODULE,
                    "server offers v{} ({} bytes)",
                    info.version,
                    info.size
                );
                self.status = UpdateStatus::UpdateAvailable;
                self.pending_size = info.size;
                Ok(RequestOutcome::UpdateAvailable(info.version))
            }
            None => {
                ota_log_info!(self.log, MODULE, "up to date at v{}", running);
                self.status = UpdateStatus::NoUpdate;
                Ok(RequestOutcome::UpToDate)
            }
        }
    }

    /// Download the offered file into the staging area
    ///
    /// A no-op when resuming an interrupted update; the file is already
    /// staged.
    ///
    /// # Errors
    ///
    /// [`Error::NoUpdateAvailable`] when the last check found nothing
    /// newer; [`Error::InvalidState`] unless an update was offered;
    /// [`Error::BufferTooSmall`] if the file outgrows the staging area;
    /// transport and flash errors mark the session failed.
    pub fn download(&mut self) -> Result<()> {
        match self.status {
            UpdateStatus::InterruptedUpdate => {
                ota_log_info!(self.log, MODULE, "skipping download, file already staged");
                return Ok(());
            }
            UpdateStatus::UpdateAvailable => {}
            UpdateStatus::NoUpdate => return Err(Error::NoUpdateAvailable),
            _ => return Err(Error::InvalidState),
        }

        if let Err(e) = self.download_inner() {
            ota_log_error!(self.log, MODULE, "download failed: {}", e);
            self.status = UpdateStatus::Failed;
            return Err(e);
        }
        ota_log_info!(self.log, MODULE, "download complete");
        self.status = UpdateStatus::Downloaded;
        Ok(())
    }

    fn download_inner(&mut self) -> Result<()> {
        let layout = *self.registry.layout();
        if self.pending_size > layout.staging_size {
            return Err(Error::BufferTooSmall);
        }
        self.registry
            .flash_mut()
            .erase_range(layout.staging_base, layout.staging_size)?;

        let mut buf = [0u8; DOWNLOAD_CHUNK];
        let mut offset = 0u32;
        loop {
            let n = self.transport.read_chunk(offset, &mut buf)?;
            if n == 0 {
                break;
            }
            if offset + n as u32 > layout.staging_size {
                return Err(Error::BufferTooSmall);
            }
            self.registry
                .flash_mut()
                .write(layout.staging_base + offset, &buf[..n])?;
            offset += n as u32;
        }
        Ok(())
    }

    /// Validate the staged file and install it into a free slot
    ///
    /// Returns the slot installed into. The staged file stays in place
    /// so the bootloader can reconcile a failed first boot of the new
    /// image.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless a file is staged; validation
    /// errors from the file; [`Error::Exhausted`] if the only candidate
    /// slot is the one running this session.
    pub fn install(&mut self) -> Result<u8> {
        match self.status {
            UpdateStatus::Downloaded | UpdateStatus::InterruptedUpdate => {}
            _ => return Err(Error::InvalidState),
        }

        match self.install_inner() {
            Ok(slot) => {
                ota_log_info!(self.log, MODULE, "installed into slot {}", slot);
                self.status = UpdateStatus::Idle;
                Ok(slot)
            }
            Err(e) => {
                if e.is_security_error() {
                    ota_log_error!(self.log, MODULE, "install rejected: {}", e);
                } else {
                    ota_log_warn!(self.log, MODULE, "install failed: {}", e);
                }
                self.status = UpdateStatus::Failed;
                Err(e)
            }
        }
    }

    fn install_inner(&mut self) -> Result<u8> {
        let material = validate_file(&self.registry, &self.server_pk, &self.device_sk)?;
        let slot = self.registry.find_empty()?;
        if slot == self.registry.layout().running_slot {
            return Err(Error::Exhausted);
        }
        install(&mut self.registry, slot, material)?;
        Ok(slot)
    }

    /// Reboot into the bootloader to pick up the installed image
    pub fn reboot<R: ResetInterface>(&mut self, reset: &mut R) -> ! {
        ota_log_info!(self.log, MODULE, "rebooting to apply update");
        reset.soft_reset()
    }
}
