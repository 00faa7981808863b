// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Streaming installation of a validated update file
//!
//! The target slot is erased, padded, given the staged file's header
//! verbatim, and then filled with the decrypted body in small chunks,
//! each written to flash before the next is read. A power cut leaves a
//! partially written slot; the boot path detects and reconciles that
//! using the staged file, which is only erased once the new image has
//! proven itself.

use ota_common::config::{FILE_HEADER_SPACE, VTOR_ALIGN};
use ota_common::{Error, Result};
use ota_crypto::CbcDecryptor;
use ota_hal::FlashInterface;
use ota_slots::{FirmwareMetadata, SlotRegistry};
use zeroize::Zeroize;

use crate::validate::DecryptionMaterial;
use crate::wire::{encrypted_size, staged_metadata, BODY_OFFSET, OUTER_SIG_OFFSET};

/// Bytes moved per flash transaction (4 AES blocks)
const CHUNK: usize = 64;

/// Fill byte for the reserved space below the slot header
const PAD: u8 = 0xAA;

/// Install the staged update file into `slot`
///
/// Must only be called with material returned by
/// [`crate::validate_file`] for the currently staged file; the material
/// is consumed and zeroized when installation ends, successfully or
/// not.
///
/// # Errors
///
/// - [`Error::InvalidSlot`]: unmanaged slot index
/// - [`Error::StructuralMismatch`]: the file's image base address does
///   not correspond to this slot
/// - [`Error::InvalidParameter`]: image does not fit the slot
/// - [`Error::FlashIo`]: flash erase or program failure; the slot is
///   left partially written
pub fn install<F: FlashInterface>(
    registry: &mut SlotRegistry<F>,
    slot: u8,
    material: DecryptionMaterial,
) -> Result<FirmwareMetadata> {
    let layout = *registry.layout();
    let slot_addr = layout.slot_address(slot)?;
    let meta = staged_metadata(registry.flash(), &layout)?;

    // images are linked for a fixed address; installing into any other
    // slot would produce an unbootable image
    if meta.vector_base.checked_sub(VTOR_ALIGN) != Some(slot_addr) {
        return Err(Error::StructuralMismatch);
    }
    let enc_size = encrypted_size(meta.size).ok_or(Error::InvalidParameter)?;
    if VTOR_ALIGN
        .checked_add(enc_size)
        .map_or(true, |end| end > layout.slot_size)
    {
        return Err(Error::InvalidParameter);
    }

    registry.erase_slot(slot)?;

    // reserved space below the copied header
    let pad = [PAD; CHUNK];
    let pad_len = VTOR_ALIGN - FILE_HEADER_SPACE;
    let mut offset = 0u32;
    while offset < pad_len {
        let n = core::cmp::min(CHUNK as u32, pad_len - offset) as usize;
        registry.flash_mut().write(slot_addr + offset, &pad[..n])?;
        offset += n as u32;
    }

    // staged header (signature envelopes + metadata space) goes in verbatim
    let header_src = layout.staging_base + OUTER_SIG_OFFSET;
    let header_dst = slot_addr + pad_len;
    let mut buf = [0u8; CHUNK];
    let mut offset = 0u32;
    while offset < FILE_HEADER_SPACE {
        let n = core::cmp::min(CHUNK as u32, FILE_HEADER_SPACE - offset) as usize;
        registry.flash().read(header_src + offset, &mut buf[..n])?;
        registry.flash_mut().write(header_dst + offset, &buf[..n])?;
        offset += n as u32;
    }

    // stream-decrypt the body straight into the slot
    let body_src = layout.staging_base + BODY_OFFSET;
    let body_dst = slot_addr + VTOR_ALIGN;
    let mut decryptor = CbcDecryptor::new(&material.key, &material.iv);
    let mut ct = [0u8; CHUNK];
    let mut pt = [0u8; CHUNK];
    let mut offset = 0u32;
    let result: Result<()> = loop {
        if offset >= enc_size {
            break Ok(());
        }
        let n = core::cmp::min(CHUNK as u32, enc_size - offset) as usize;
        if let Err(e) = registry.flash().read(body_src + offset, &mut ct[..n]) {
            break Err(e.into());
        }
        if let Err(e) = decryptor.decrypt(&ct[..n], &mut pt[..n]) {
            break Err(e.into());
        }
        if let Err(e) = registry.flash_mut().write(body_dst + offset, &pt[..n]) {
            break Err(e.into());
        }
        offset += n as u32;
    };
    pt.zeroize();
    drop(material);
    result?;

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{build_update_file, stage, UpdateFileSpec};
    use crate::validate::validate_file;
    use ota_common::{ChipId, HardwareId, SlotLayout};
    use ota_crypto::{BoxPublicKey, BoxSecretKey, AES_BLOCK_LEN, AES_KEY_LEN};
    use ota_hal::sim::SimFlash;

    const BASE: u32 = 0x0804_0000;
    const HW_ID: u64 = 0xC0DE;
    type Flash = SimFlash<0x4000, 1024>;

    fn layout() -> SlotLayout {
        SlotLayout {
            slot_base: BASE,
            slot_size: 0x1000,
            slot_count: 2,
            staging_base: BASE + 0x2000,
            staging_size: 0x2000,
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

    /// Stage a valid file targeting `slot` with an odd-sized image
    fn staged_registry(slot: u8, version: u16, image: &[u8]) -> SlotRegistry<Flash> {
        let lay = layout();
        let (server_sk, _, _, device_pk) = keys();
        let spec = UpdateFileSpec {
            meta: FirmwareMetadata {
                hw_id: HardwareId::from_u64(HW_ID),
                chip_id: ChipId::new([1u8; 16]),
                version,
                vector_base: lay.vector_address(slot).unwrap(),
                size: image.len() as u32,
            },
            image,
            key: [0x0Fu8; AES_KEY_LEN],
            iv: [0xF0u8; AES_BLOCK_LEN],
            server_sk: &server_sk,
            device_pk: &device_pk,
        };
        let mut file = [0u8; 0x1000];
        let len = build_update_file(&spec, &mut file);
        let mut flash = Flash::new(BASE);
        stage(&mut flash, &lay, &file[..len]).unwrap();
        SlotRegistry::new(flash, lay)
    }

    #[test]
    fn installed_slot_verifies_end_to_end() {
        let image: [u8; 500] = core::array::from_fn(|i| (i * 3) as u8);
        let mut reg = staged_registry(1, 4, &image);
        let (_, server_pk, device_sk, _) = keys();

        let material = validate_file(&reg, &server_pk, &device_sk).unwrap();
        let meta = install(&mut reg, 1, material).unwrap();
        assert_eq!(meta.version, 4);

        // metadata record landed byte-exact
        let stored = reg.slot_metadata(1).unwrap().unwrap();
        assert_eq!(stored, meta);

        // plaintext image landed byte-exact
        let mut out = [0u8; 500];
        let vec_addr = reg.layout().vector_address(1).unwrap();
        reg.flash().read(vec_addr, &mut out).unwrap();
        assert_eq!(out, image);

        // the inner envelope copied from the file verifies the slot
        assert!(reg.verify_slot(1, &server_pk, &device_sk).is_ok());
    }

    #[test]
    fn wrong_slot_is_structural_mismatch() {
        // file linked for slot 1, install attempted into slot 2
        let image = [0x11u8; 64];
        let mut reg = staged_registry(1, 4, &image);
        let (_, server_pk, device_sk, _) = keys();
        let material = validate_file(&reg, &server_pk, &device_sk).unwrap();
        assert_eq!(
            install(&mut reg, 2, material),
            Err(Error::StructuralMismatch)
        );
    }

    #[test]
    fn oversized_image_rejected() {
        // slot holds 0x1000 - 0x200 bytes of image at most
        let image = [0u8; 0x1000 - 0x200 + 16];
        let mut reg = staged_registry(1, 4, &image);
        let (_, server_pk, device_sk, _) = keys();
        let material = validate_file(&reg, &server_pk, &device_sk).unwrap();
        assert_eq!(install(&mut reg, 1, material), Err(Error::InvalidParameter));
    }

    #[test]
    fn power_loss_leaves_partial_slot() {
        let image = [0x42u8; 900];
        let mut reg = staged_registry(1, 4, &image);
        let (_, server_pk, device_sk, _) = keys();
        let material = validate_file(&reg, &server_pk, &device_sk).unwrap();

        // cut power after the header and part of the body have landed
        reg.flash_mut().set_write_budget(Some(0x200 + 300));
        assert_eq!(install(&mut reg, 1, material), Err(Error::FlashIo));
        reg.flash_mut().set_write_budget(None);

        // metadata made it, so the slot looks populated but will not
        // verify; exactly the state boot reconciliation handles
        assert!(reg.slot_metadata(1).unwrap().is_some());
        assert_eq!(
            reg.verify_slot(1, &server_pk, &device_sk),
            Err(Error::SignatureInvalid)
        );
    }

    #[test]
    fn partial_final_block_padding_is_written() {
        // 20-byte image pads to 32 encrypted bytes
        let image = [0x99u8; 20];
        let mut reg = staged_registry(1, 4, &image);
        let (_, server_pk, device_sk, _) = keys();
        let material = validate_file(&reg, &server_pk, &device_sk).unwrap();
        install(&mut reg, 1, material).unwrap();

        let vec_addr = reg.layout().vector_address(1).unwrap();
        let mut out = [0u8; 32];
        reg.flash().read(vec_addr, &mut out).unwrap();
        assert_eq!(&out[..20], &image);
        // builder zero-pads the final block
        assert_eq!(&out[20..], &[0u8; 12]);
    }
}
