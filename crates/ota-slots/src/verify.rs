// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! In-flash slot verification
//!
//! A populated slot carries a signature envelope sealed by the update
//! server over the SHA-256 digest of its metadata area plus the
//! installed image. Verification streams the flash contents through the
//! hasher in small chunks, so image size is bounded by the slot, not by
//! RAM.

use ota_common::config::{METADATA_SPACE, VTOR_ALIGN};
use ota_common::{Error, Result};
use ota_crypto::{constant_time_eq, sealed_len, BoxPublicKey, BoxSecretKey, StreamingSha256};
use ota_hal::FlashInterface;

use crate::metadata::FirmwareMetadata;
use crate::registry::SlotRegistry;

/// Flash read chunk used while hashing
const HASH_CHUNK: usize = 1024;

/// Length of the slot signature envelope
const SLOT_ENVELOPE_LEN: usize = sealed_len(ota_crypto::DIGEST_LEN);

impl<F: FlashInterface> SlotRegistry<F> {
    /// Verify a populated slot against its signature envelope
    ///
    /// Checks, in order: the metadata record parses, the hardware id
    /// matches this device, the recorded size fits the slot, and the
    /// digest of the metadata area plus the installed image matches the
    /// digest sealed by the update server. Returns the verified metadata
    /// on success.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSlot`] for an unmanaged index
    /// - [`Error::StructuralMismatch`] for an empty slot, a foreign
    ///   hardware id, or a size field past the slot's image capacity
    /// - [`Error::SignatureInvalid`] if the envelope does not open or
    ///   the digest differs
    /// - [`Error::FlashIo`] on a read failure
    pub fn verify_slot(
        &self,
        slot: u8,
        server_pk: &BoxPublicKey,
        device_sk: &BoxSecretKey,
    ) -> Result<FirmwareMetadata> {
        let meta = self
            .slot_metadata(slot)?
            .ok_or(Error::StructuralMismatch)?;
        if meta.hw_id != self.layout().hw_id {
            return Err(Error::StructuralMismatch);
        }
        // the size field comes from flash; a rotted record with intact
        // magic must not drive the hash loop past the slot
        if meta.size > self.layout().slot_size - VTOR_ALIGN {
            return Err(Error::StructuralMismatch);
        }

        // digest covers the metadata area and the image right after it
        let start = self.layout().metadata_address(slot)?;
        let total = METADATA_SPACE + meta.size;
        let mut hasher = StreamingSha256::new();
        let mut buf = [0u8; HASH_CHUNK];
        let mut offset = 0u32;
        while offset < total {
            let n = core::cmp::min(HASH_CHUNK as u32, total - offset) as usize;
            self.flash().read(start + offset, &mut buf[..n])?;
            hasher.update(&buf[..n]);
            offset += n as u32;
        }
        let computed = hasher.finalize();

        let mut envelope = [0u8; SLOT_ENVELOPE_LEN];
        self.flash()
            .read(self.layout().signature_address(slot)?, &mut envelope)?;
        let mut expected = [0u8; ota_crypto::DIGEST_LEN];
        ota_crypto::open(&envelope, server_pk, device_sk, &mut expected)?;

        if !constant_time_eq(&computed, &expected) {
            return Err(Error::SignatureInvalid);
        }
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_common::{ChipId, HardwareId, SlotLayout};
    use ota_crypto::NONCE_LEN;
    use ota_hal::sim::SimFlash;

    const BASE: u32 = 0x0804_0000;
    type Flash = SimFlash<0x2000, 1024>;

    const HW_ID: u64 = 0xC0DE;

    fn layout() -> SlotLayout {
        SlotLayout {
            slot_base: BASE,
            slot_size: 0x1000,
            slot_count: 1,
            staging_base: BASE + 0x1000,
            staging_size: 0x1000,
            hw_id: HardwareId::from_u64(HW_ID),
            running_slot: 0,
        }
    }

    fn keys() -> (BoxSecretKey, BoxPublicKey, BoxSecretKey, BoxPublicKey) {
        let server_sk = BoxSecretKey::new([0x11; 32]);
        let server_pk = server_sk.public_key();
        let device_sk = BoxSecretKey::new([0x22; 32]);
        let device_pk = device_sk.public_key();
        (server_sk, server_pk, device_sk, device_pk)
    }

    /// Lay out a signed slot by hand: metadata record, image, envelope
    fn install_signed_slot(reg: &mut SlotRegistry<Flash>, version: u16, image: &[u8]) {
        let meta = FirmwareMetadata {
            hw_id: HardwareId::from_u64(HW_ID),
            chip_id: ChipId::new([7u8; 16]),
            version,
            vector_base: reg.layout().vector_address(1).unwrap(),
            size: image.len() as u32,
        };
        let meta_addr = reg.layout().metadata_address(1).unwrap();
        let vec_addr = reg.layout().vector_address(1).unwrap();
        reg.flash_mut().write(meta_addr, &meta.to_bytes()).unwrap();
        reg.flash_mut().write(vec_addr, image).unwrap();

        // digest over the full metadata space (record + erased tail) + image
        let mut hasher = StreamingSha256::new();
        hasher.update(&meta.to_bytes());
        hasher.update(&[0xFFu8; METADATA_SPACE as usize - crate::METADATA_LEN]);
        hasher.update(image);
        let digest = hasher.finalize();

        let (server_sk, _, _, device_pk) = keys();
        let mut envelope = [0u8; SLOT_ENVELOPE_LEN];
        ota_crypto::seal(
            &digest,
            &[3u8; NONCE_LEN],
            &device_pk,
            &server_sk,
            &mut envelope,
        )
        .unwrap();
        let sig_addr = reg.layout().signature_address(1).unwrap();
        reg.flash_mut().write(sig_addr, &envelope).unwrap();
    }

    #[test]
    fn valid_slot_verifies() {
        let mut reg = SlotRegistry::new(Flash::new(BASE), layout());
        let image = [0x5Au8; 256];
        install_signed_slot(&mut reg, 3, &image);

        let (_, server_pk, device_sk, _) = keys();
        let meta = reg.verify_slot(1, &server_pk, &device_sk).unwrap();
        assert_eq!(meta.version, 3);
        assert_eq!(meta.size, 256);
    }

    #[test]
    fn corrupted_image_fails() {
        let mut reg = SlotRegistry::new(Flash::new(BASE), layout());
        install_signed_slot(&mut reg, 3, &[0x5Au8; 256]);
        let vec_addr = reg.layout().vector_address(1).unwrap();
        reg.flash_mut().corrupt(vec_addr + 100, 0x01);

        let (_, server_pk, device_sk, _) = keys();
        assert_eq!(
            reg.verify_slot(1, &server_pk, &device_sk),
            Err(Error::SignatureInvalid)
        );
    }

    #[test]
    fn empty_slot_fails_structurally() {
        let reg = SlotRegistry::new(Flash::new(BASE), layout());
        let (_, server_pk, device_sk, _) = keys();
        assert_eq!(
            reg.verify_slot(1, &server_pk, &device_sk),
            Err(Error::StructuralMismatch)
        );
    }

    #[test]
    fn rotted_size_field_fails_structurally() {
        let mut reg = SlotRegistry::new(Flash::new(BASE), layout());
        // magic intact, size field absurd; must reject before hashing
        for size in [u32::MAX - 0x20, 0x1000 - 0x200 + 1] {
            let meta = FirmwareMetadata {
                hw_id: HardwareId::from_u64(HW_ID),
                chip_id: ChipId::new([7u8; 16]),
                version: 3,
                vector_base: reg.layout().vector_address(1).unwrap(),
                size,
            };
            let meta_addr = reg.layout().metadata_address(1).unwrap();
            reg.flash_mut().erase_page(meta_addr).unwrap();
            reg.flash_mut().write(meta_addr, &meta.to_bytes()).unwrap();

            let (_, server_pk, device_sk, _) = keys();
            assert_eq!(
                reg.verify_slot(1, &server_pk, &device_sk),
                Err(Error::StructuralMismatch)
            );
        }
    }

    #[test]
    fn foreign_hardware_id_fails() {
        let mut reg = SlotRegistry::new(Flash::new(BASE), layout());
        install_signed_slot(&mut reg, 3, &[0x5Au8; 64]);

        // same flash contents, device provisioned for different hardware
        let mut lay = layout();
        lay.hw_id = HardwareId::from_u64(0xBAD);
        let flash = core::mem::replace(reg.flash_mut(), Flash::new(BASE));
        let reg = SlotRegistry::new(flash, lay);
        let (_, server_pk, device_sk, _) = keys();
        assert_eq!(
            reg.verify_slot(1, &server_pk, &device_sk),
            Err(Error::StructuralMismatch)
        );
    }

    #[test]
    fn wrong_server_key_fails() {
        let mut reg = SlotRegistry::new(Flash::new(BASE), layout());
        install_signed_slot(&mut reg, 3, &[0x5Au8; 64]);

        let (_, _, device_sk, _) = keys();
        let imposter_pk = BoxSecretKey::new([0x33; 32]).public_key();
        assert_eq!(
            reg.verify_slot(1, &imposter_pk, &device_sk),
            Err(Error::SignatureInvalid)
        );
    }
}
