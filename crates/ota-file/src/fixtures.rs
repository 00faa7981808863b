// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Update file builder for tests
//!
//! Produces byte-exact update files the validator accepts: real sealed
//! envelopes, real CBC-encrypted bodies. Lives behind `cfg(test)` and
//! the `fixtures` feature so integration tests of downstream crates can
//! stage genuine files into a simulated flash.

use ota_common::{Result, SlotLayout};
use ota_crypto::{
    sealed_len, BoxPublicKey, BoxSecretKey, CbcEncryptor, StreamingSha256, AES_BLOCK_LEN,
    AES_KEY_LEN, DIGEST_LEN, NONCE_LEN,
};
use ota_hal::FlashInterface;
use ota_slots::FirmwareMetadata;

use crate::wire::{
    encrypted_size, BODY_OFFSET, FILE_MAGIC_HI, FILE_MAGIC_LO, INNER_SIG_OFFSET, METADATA_OFFSET,
    OUTER_SIG_OFFSET,
};

/// Everything needed to build a signed, encrypted update file
pub struct UpdateFileSpec<'a> {
    /// Metadata record to embed (its `size` must equal `image.len()`)
    pub meta: FirmwareMetadata,
    /// Plaintext firmware image
    pub image: &'a [u8],
    /// Body encryption key
    pub key: [u8; AES_KEY_LEN],
    /// Body encryption IV
    pub iv: [u8; AES_BLOCK_LEN],
    /// Update server secret key (seals both envelopes)
    pub server_sk: &'a BoxSecretKey,
    /// Device public key (envelope recipient)
    pub device_pk: &'a BoxPublicKey,
}

/// Build a complete update file into `out`, returning its length
///
/// # Panics
///
/// Panics if `out` is too small or `meta.size` disagrees with the image
/// length; fixture misuse is a test bug.
pub fn build_update_file(spec: &UpdateFileSpec<'_>, out: &mut [u8]) -> usize {
    assert_eq!(spec.meta.size as usize, spec.image.len());
    let enc_size = encrypted_size(spec.meta.size).unwrap() as usize;
    let total = BODY_OFFSET as usize + enc_size;
    assert!(out.len() >= total, "fixture buffer too small");

    out[..total].fill(0xFF);
    out[0..4].copy_from_slice(&FILE_MAGIC_HI.to_le_bytes());
    out[4..8].copy_from_slice(&FILE_MAGIC_LO.to_le_bytes());

    let meta_off = METADATA_OFFSET as usize;
    out[meta_off..meta_off + 40].copy_from_slice(&spec.meta.to_bytes());

    // encrypt the body, zero-padding the final partial block
    let body_off = BODY_OFFSET as usize;
    let mut enc = CbcEncryptor::new(&spec.key, &spec.iv);
    let mut offset = 0usize;
    while offset < enc_size {
        let n = core::cmp::min(64, enc_size - offset);
        let mut pt = [0u8; 64];
        let remaining = spec.image.len().saturating_sub(offset);
        let copy = core::cmp::min(n, remaining);
        pt[..copy].copy_from_slice(&spec.image[offset..offset + copy]);
        let mut ct = [0u8; 64];
        enc.encrypt(&pt[..n], &mut ct[..n]).unwrap();
        out[body_off + offset..body_off + offset + n].copy_from_slice(&ct[..n]);
        offset += n;
    }

    // inner envelope: digest of the metadata space plus the plaintext
    // image, exactly what slot verification re-hashes after install
    let inner_off = INNER_SIG_OFFSET as usize;
    let mut hasher = StreamingSha256::new();
    hasher.update(&out[meta_off..body_off]);
    hasher.update(spec.image);
    let inner_digest = hasher.finalize();
    let mut inner_env = [0u8; sealed_len(DIGEST_LEN)];
    ota_crypto::seal(
        &inner_digest,
        &[0x24u8; NONCE_LEN],
        spec.device_pk,
        spec.server_sk,
        &mut inner_env,
    )
    .unwrap();
    out[inner_off..inner_off + inner_env.len()].copy_from_slice(&inner_env);

    // outer envelope: digest of everything after the envelope itself,
    // plus the body decryption material
    let mut hasher = StreamingSha256::new();
    hasher.update(&out[inner_off..total]);
    let outer_digest = hasher.finalize();
    let mut plaintext = [0u8; DIGEST_LEN + AES_BLOCK_LEN + AES_KEY_LEN];
    plaintext[..DIGEST_LEN].copy_from_slice(&outer_digest);
    plaintext[DIGEST_LEN..DIGEST_LEN + AES_BLOCK_LEN].copy_from_slice(&spec.iv);
    plaintext[DIGEST_LEN + AES_BLOCK_LEN..].copy_from_slice(&spec.key);
    let mut outer_env = [0u8; sealed_len(DIGEST_LEN + AES_BLOCK_LEN + AES_KEY_LEN)];
    ota_crypto::seal(
        &plaintext,
        &[0x42u8; NONCE_LEN],
        spec.device_pk,
        spec.server_sk,
        &mut outer_env,
    )
    .unwrap();
    let outer_off = OUTER_SIG_OFFSET as usize;
    out[outer_off..outer_off + outer_env.len()].copy_from_slice(&outer_env);

    total
}

/// Erase the staging area and write an update file into it
///
/// # Errors
///
/// Propagates flash errors from the simulated driver.
pub fn stage<F: FlashInterface>(flash: &mut F, layout: &SlotLayout, file: &[u8]) -> Result<()> {
    flash.erase_range(layout.staging_base, layout.staging_size)?;
    flash.write(layout.staging_base, file)?;
    Ok(())
}
