// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! AES-128-CBC block streaming
//!
//! Update file bodies are encrypted with AES-128-CBC and decrypted in
//! small chunks while being written to flash. The chaining state is kept
//! explicit so a multi-megabyte body can be processed through a 64-byte
//! buffer without ever holding two copies.
//!
//! No padding is applied; bodies are already a multiple of the block
//! size on the wire.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};

/// AES block length in bytes
pub const AES_BLOCK_LEN: usize = 16;

/// AES-128 key length in bytes
pub const AES_KEY_LEN: usize = 16;

/// Streaming AES-128-CBC decryptor
pub struct CbcDecryptor {
    cipher: Aes128,
    chain: [u8; AES_BLOCK_LEN],
}

impl CbcDecryptor {
    /// Initialize with a key and IV
    #[must_use]
    pub fn new(key: &[u8; AES_KEY_LEN], iv: &[u8; AES_BLOCK_LEN]) -> Self {
        Self {
            cipher: Aes128::new(GenericArray::from_slice(key)),
            chain: *iv,
        }
    }

    /// Decrypt a chunk of whole blocks, continuing the chain
    ///
    /// `ciphertext` and `plaintext` must have equal, block-aligned
    /// lengths. Chunks must be fed in wire order.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidLength`] on misaligned input and
    /// [`CryptoError::BufferTooSmall`] if `plaintext` is shorter than
    /// `ciphertext`.
    pub fn decrypt(&mut self, ciphertext: &[u8], plaintext: &mut [u8]) -> CryptoResult<()> {
        if ciphertext.len() % AES_BLOCK_LEN != 0 {
            return Err(CryptoError::InvalidLength);
        }
        if plaintext.len() < ciphertext.len() {
            return Err(CryptoError::BufferTooSmall);
        }
        for (ct, pt) in ciphertext
            .chunks_exact(AES_BLOCK_LEN)
            .zip(plaintext.chunks_exact_mut(AES_BLOCK_LEN))
        {
            let mut block = GenericArray::clone_from_slice(ct);
            self.cipher.decrypt_block(&mut block);
            for (out, (dec, chain)) in pt.iter_mut().zip(block.iter().zip(self.chain.iter())) {
                *out = dec ^ chain;
            }
            self.chain.copy_from_slice(ct);
        }
        Ok(())
    }
}

impl Drop for CbcDecryptor {
    fn drop(&mut self) {
        self.chain.zeroize();
    }
}

/// Streaming AES-128-CBC encryptor
///
/// Counterpart of [`CbcDecryptor`]; used when producing update files.
pub struct CbcEncryptor {
    cipher: Aes128,
    chain: [u8; AES_BLOCK_LEN],
}

impl CbcEncryptor {
    /// Initialize with a key and IV
    #[must_use]
    pub fn new(key: &[u8; AES_KEY_LEN], iv: &[u8; AES_BLOCK_LEN]) -> Self {
        Self {
            cipher: Aes128::new(GenericArray::from_slice(key)),
            chain: *iv,
        }
    }

    /// Encrypt a chunk of whole blocks, continuing the chain
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidLength`] on misaligned input and
    /// [`CryptoError::BufferTooSmall`] if `ciphertext` is shorter than
    /// `plaintext`.
    pub fn encrypt(&mut self, plaintext: &[u8], ciphertext: &mut [u8]) -> CryptoResult<()> {
        if plaintext.len() % AES_BLOCK_LEN != 0 {
            return Err(CryptoError::InvalidLength);
        }
        if ciphertext.len() < plaintext.len() {
            return Err(CryptoError::BufferTooSmall);
        }
        for (pt, ct) in plaintext
            .chunks_exact(AES_BLOCK_LEN)
            .zip(ciphertext.chunks_exact_mut(AES_BLOCK_LEN))
        {
            let mut block = GenericArray::default();
            for (b, (p, chain)) in block.iter_mut().zip(pt.iter().zip(self.chain.iter())) {
                *b = p ^ chain;
            }
            self.cipher.encrypt_block(&mut block);
            ct.copy_from_slice(&block);
            self.chain.copy_from_slice(&block);
        }
        Ok(())
    }
}

impl Drop for CbcEncryptor {
    fn drop(&mut self) {
        self.chain.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; AES_KEY_LEN] = [0x42; AES_KEY_LEN];
    const IV: [u8; AES_BLOCK_LEN] = [0x17; AES_BLOCK_LEN];

    #[test]
    fn roundtrip() {
        let plaintext: [u8; 128] = core::array::from_fn(|i| i as u8);
        let mut ciphertext = [0u8; 128];
        CbcEncryptor::new(&KEY, &IV)
            .encrypt(&plaintext, &mut ciphertext)
            .unwrap();
        assert_ne!(ciphertext, plaintext);

        let mut recovered = [0u8; 128];
        CbcDecryptor::new(&KEY, &IV)
            .decrypt(&ciphertext, &mut recovered)
            .unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn chunked_matches_one_shot() {
        let plaintext: [u8; 192] = core::array::from_fn(|i| (i * 7) as u8);
        let mut ciphertext = [0u8; 192];
        CbcEncryptor::new(&KEY, &IV)
            .encrypt(&plaintext, &mut ciphertext)
            .unwrap();

        // 64-byte chunks, as the installer streams them
        let mut chunked = [0u8; 192];
        let mut dec = CbcDecryptor::new(&KEY, &IV);
        for (ct, pt) in ciphertext.chunks(64).zip(chunked.chunks_mut(64)) {
            dec.decrypt(ct, pt).unwrap();
        }

        let mut one_shot = [0u8; 192];
        CbcDecryptor::new(&KEY, &IV)
            .decrypt(&ciphertext, &mut one_shot)
            .unwrap();
        assert_eq!(chunked, one_shot);
        assert_eq!(chunked, plaintext);
    }

    #[test]
    fn final_partial_chunk() {
        // 80 bytes = one full 64-byte chunk plus a 16-byte tail
        let plaintext: [u8; 80] = core::array::from_fn(|i| (i ^ 0x5A) as u8);
        let mut ciphertext = [0u8; 80];
        CbcEncryptor::new(&KEY, &IV)
            .encrypt(&plaintext, &mut ciphertext)
            .unwrap();

        let mut recovered = [0u8; 80];
        let mut dec = CbcDecryptor::new(&KEY, &IV);
        dec.decrypt(&ciphertext[..64], &mut recovered[..64]).unwrap();
        dec.decrypt(&ciphertext[64..], &mut recovered[64..]).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn misaligned_input_rejected() {
        let mut dec = CbcDecryptor::new(&KEY, &IV);
        let mut out = [0u8; 32];
        assert_eq!(
            dec.decrypt(&[0u8; 15], &mut out),
            Err(CryptoError::InvalidLength)
        );
    }
}
