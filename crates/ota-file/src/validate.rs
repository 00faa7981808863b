// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Staged update file validation
//!
//! Gates run cheapest-first so malformed or misdirected files are
//! rejected before any flash-wide hashing:
//!
//! 1. file magic words
//! 2. metadata record magic
//! 3. hardware id against this device
//! 4. anti-rollback against the running firmware version
//! 5. streamed digest of everything the outer envelope covers
//! 6. outer envelope opens under the server/device keypair
//! 7. digest comparison, constant time
//!
//! Only a file that passes every gate yields its body decryption
//! material. The material is scoped to a single installation; it
//! zeroizes on drop and is never written anywhere.

use ota_common::{Error, Result};
use ota_crypto::{
    constant_time_eq, sealed_len, BoxPublicKey, BoxSecretKey, StreamingSha256, AES_BLOCK_LEN,
    AES_KEY_LEN, DIGEST_LEN,
};
use ota_hal::FlashInterface;
use ota_slots::SlotRegistry;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::wire::{encrypted_size, staged_magic_ok, staged_metadata, BODY_OFFSET, INNER_SIG_OFFSET, OUTER_SIG_OFFSET};

/// Flash read chunk used while hashing
const HASH_CHUNK: usize = 1024;

/// Outer envelope plaintext: digest, then IV, then key
const OUTER_PLAINTEXT_LEN: usize = DIGEST_LEN + AES_BLOCK_LEN + AES_KEY_LEN;

/// Outer envelope length on the wire
const OUTER_ENVELOPE_LEN: usize = sealed_len(OUTER_PLAINTEXT_LEN);

/// Body decryption material recovered from a validated file
///
/// Exists only between validation and the end of the installation that
/// consumes it. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DecryptionMaterial {
    /// AES-128 body key
    pub key: [u8; AES_KEY_LEN],
    /// CBC initialization vector
    pub iv: [u8; AES_BLOCK_LEN],
}

/// Validate the staged update file
///
/// On success returns the body decryption material; the staged file may
/// then be installed with [`crate::install`].
///
/// # Errors
///
/// - [`Error::StructuralMismatch`]: bad magic words, unparseable
///   metadata, or a foreign hardware id
/// - [`Error::RollbackAttempted`]: version not strictly newer than the
///   running firmware
/// - [`Error::InvalidParameter`]: body does not fit the staging area
/// - [`Error::SignatureInvalid`]: envelope authentication or digest
///   comparison failed
/// - [`Error::FlashIo`]: flash read failure
pub fn validate_file<F: FlashInterface>(
    registry: &SlotRegistry<F>,
    server_pk: &BoxPublicKey,
    device_sk: &BoxSecretKey,
) -> Result<DecryptionMaterial> {
    let layout = registry.layout();
    let flash = registry.flash();

    if !staged_magic_ok(flash, layout)? {
        return Err(Error::StructuralMismatch);
    }
    let meta = staged_metadata(flash, layout)?;
    if meta.hw_id != layout.hw_id {
        return Err(Error::StructuralMismatch);
    }
    if meta.version <= registry.running_version() {
        return Err(Error::RollbackAttempted);
    }

    let enc_size = encrypted_size(meta.size).ok_or(Error::InvalidParameter)?;
    if BODY_OFFSET
        .checked_add(enc_size)
        .map_or(true, |end| end > layout.staging_size)
    {
        return Err(Error::InvalidParameter);
    }

    // digest everything the outer envelope covers: inner envelope
    // space, metadata space, encrypted body
    let start = layout.staging_base + INNER_SIG_OFFSET;
    let total = BODY_OFFSET - INNER_SIG_OFFSET + enc_size;
    let mut hasher = StreamingSha256::new();
    let mut buf = [0u8; HASH_CHUNK];
    let mut offset = 0u32;
    while offset < total {
        let n = core::cmp::min(HASH_CHUNK as u32, total - offset) as usize;
        flash.read(start + offset, &mut buf[..n])?;
        hasher.update(&buf[..n]);
        offset += n as u32;
    }
    let computed = hasher.finalize();

    let mut envelope = [0u8; OUTER_ENVELOPE_LEN];
    flash.read(layout.staging_base + OUTER_SIG_OFFSET, &mut envelope)?;
    let mut plaintext = [0u8; OUTER_PLAINTEXT_LEN];
    let opened = ota_crypto::open(&envelope, server_pk, device_sk, &mut plaintext);
    if let Err(e) = opened {
        plaintext.zeroize();
        return Err(e.into());
    }

    if !constant_time_eq(&computed, &plaintext[..DIGEST_LEN]) {
        plaintext.zeroize();
        return Err(Error::SignatureInvalid);
    }

    let mut material = DecryptionMaterial {
        key: [0u8; AES_KEY_LEN],
        iv: [0u8; AES_BLOCK_LEN],
    };
    material
        .iv
        .copy_from_slice(&plaintext[DIGEST_LEN..DIGEST_LEN + AES_BLOCK_LEN]);
    material
        .key
        .copy_from_slice(&plaintext[DIGEST_LEN + AES_BLOCK_LEN..]);
    plaintext.zeroize();
    Ok(material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{build_update_file, stage, UpdateFileSpec};
    use crate::wire::{FILE_MAGIC_HI, FILE_MAGIC_LO, METADATA_OFFSET};
    use ota_common::{ChipId, HardwareId, SlotLayout};
    use ota_hal::sim::SimFlash;
    use ota_slots::FirmwareMetadata;

    const BASE: u32 = 0x0804_0000;
    const HW_ID: u64 = 0xC0DE;
    type Flash = SimFlash<0x4000, 1024>;

    fn layout(running_slot: u8) -> SlotLayout {
        SlotLayout {
            slot_base: BASE,
            slot_size: 0x1000,
            slot_count: 2,
            staging_base: BASE + 0x2000,
            staging_size: 0x2000,
            hw_id: HardwareId::from_u64(HW_ID),
            running_slot,
        }
    }

    fn keys() -> (BoxSecretKey, BoxPublicKey, BoxSecretKey, BoxPublicKey) {
        let server_sk = BoxSecretKey::new([0x11; 32]);
        let server_pk = server_sk.public_key();
        let device_sk = BoxSecretKey::new([0x22; 32]);
        let device_pk = device_sk.public_key();
        (server_sk, server_pk, device_sk, device_pk)
    }

    fn meta(version: u16) -> FirmwareMetadata {
        FirmwareMetadata {
            hw_id: HardwareId::from_u64(HW_ID),
            chip_id: ChipId::new([1u8; 16]),
            version,
            vector_base: BASE + 0x200,
            size: 200,
        }
    }

    fn stage_file(flash: &mut Flash, lay: &SlotLayout, version: u16) {
        let (server_sk, _, _, device_pk) = keys();
        let image = [0x77u8; 200];
        let spec = UpdateFileSpec {
            meta: meta(version),
            image: &image,
            key: [0x0Fu8; AES_KEY_LEN],
            iv: [0xF0u8; AES_BLOCK_LEN],
            server_sk: &server_sk,
            device_pk: &device_pk,
        };
        let mut file = [0u8; 0x800];
        let len = build_update_file(&spec, &mut file);
        stage(flash, lay, &file[..len]).unwrap();
    }

    fn staged_registry(version: u16) -> SlotRegistry<Flash> {
        let lay = layout(0);
        let mut flash = Flash::new(BASE);
        stage_file(&mut flash, &lay, version);
        SlotRegistry::new(flash, lay)
    }

    #[test]
    fn valid_file_yields_material() {
        let reg = staged_registry(5);
        let (_, server_pk, device_sk, _) = keys();
        let material = validate_file(&reg, &server_pk, &device_sk).unwrap();
        assert_eq!(material.key, [0x0Fu8; AES_KEY_LEN]);
        assert_eq!(material.iv, [0xF0u8; AES_BLOCK_LEN]);
    }

    #[test]
    fn bad_magic_rejected_before_crypto() {
        let mut reg = staged_registry(5);
        let staging = reg.layout().staging_base;
        // flip a magic bit without touching anything signed
        reg.flash_mut().corrupt(staging, 0x01);
        let (_, server_pk, device_sk, _) = keys();
        assert!(matches!(
            validate_file(&reg, &server_pk, &device_sk),
            Err(Error::StructuralMismatch)
        ));
    }

    #[test]
    fn corrupted_body_fails_signature() {
        let mut reg = staged_registry(5);
        let body = reg.layout().staging_base + BODY_OFFSET;
        reg.flash_mut().corrupt(body + 50, 0x80);
        let (_, server_pk, device_sk, _) = keys();
        assert!(matches!(
            validate_file(&reg, &server_pk, &device_sk),
            Err(Error::SignatureInvalid)
        ));
    }

    #[test]
    fn hostile_declared_size_rejected() {
        // magics and a parseable record are enough to reach the size
        // gate; the first value cannot be padded at all, the second
        // pads fine but cannot fit behind the header
        for size in [u32::MAX - 3, u32::MAX - 15] {
            let lay = layout(0);
            let mut flash = Flash::new(BASE);
            flash
                .write(lay.staging_base, &FILE_MAGIC_HI.to_le_bytes())
                .unwrap();
            flash
                .write(lay.staging_base + 4, &FILE_MAGIC_LO.to_le_bytes())
                .unwrap();
            let mut m = meta(5);
            m.size = size;
            flash
                .write(lay.staging_base + METADATA_OFFSET, &m.to_bytes())
                .unwrap();
            let reg = SlotRegistry::new(flash, lay);

            let (_, server_pk, device_sk, _) = keys();
            assert!(matches!(
                validate_file(&reg, &server_pk, &device_sk),
                Err(Error::InvalidParameter)
            ));
        }
    }

    #[test]
    fn equal_version_is_rollback() {
        // running slot 1 at version 5, staged file also version 5
        let lay = layout(1);
        let mut flash = Flash::new(BASE);
        stage_file(&mut flash, &lay, 5);
        flash
            .write(lay.metadata_address(1).unwrap(), &meta(5).to_bytes())
            .unwrap();
        let reg = SlotRegistry::new(flash, lay);

        let (_, server_pk, device_sk, _) = keys();
        assert!(matches!(
            validate_file(&reg, &server_pk, &device_sk),
            Err(Error::RollbackAttempted)
        ));
    }

    #[test]
    fn newer_version_passes_rollback_gate() {
        // running slot 1 at version 5, staged file at version 6
        let lay = layout(1);
        let mut flash = Flash::new(BASE);
        stage_file(&mut flash, &lay, 6);
        flash
            .write(lay.metadata_address(1).unwrap(), &meta(5).to_bytes())
            .unwrap();
        let reg = SlotRegistry::new(flash, lay);

        let (_, server_pk, device_sk, _) = keys();
        assert!(validate_file(&reg, &server_pk, &device_sk).is_ok());
    }

    #[test]
    fn wrong_device_key_fails() {
        let reg = staged_registry(5);
        let (_, server_pk, _, _) = keys();
        let other_sk = BoxSecretKey::new([0x33; 32]);
        assert!(matches!(
            validate_file(&reg, &server_pk, &other_sk),
            Err(Error::SignatureInvalid)
        ));
    }
}
