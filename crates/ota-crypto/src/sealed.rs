// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Authenticated sealed boxes
//!
//! An update server and a device each hold an X25519 keypair. Signature
//! envelopes are sealed from the server's secret key to the device's
//! public key: the shared secret is derived with X25519, run through a
//! domain-separated SHA-256 KDF, and used as a ChaCha20-Poly1305 key.
//!
//! Wire format of an envelope:
//!
//! ```text
//! +-------------+------------------+----------+
//! | nonce (12)  | ciphertext (len) | tag (16) |
//! +-------------+------------------+----------+
//! ```
//!
//! Opening authenticates both the content and the sender: only the
//! holder of the server secret key can produce an envelope the device
//! accepts.

use chacha20poly1305::aead::AeadInPlace;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce, Tag};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Nonce length of an envelope in bytes
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Length of a public or secret key in bytes
pub const KEY_LEN: usize = 32;

/// Domain separation label for the key derivation
const KDF_DOMAIN: &[u8] = b"ota.sealed.v1";

/// Total envelope length for a given plaintext length
#[must_use]
pub const fn sealed_len(plaintext_len: usize) -> usize {
    NONCE_LEN + plaintext_len + TAG_LEN
}

/// An X25519 public key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxPublicKey([u8; KEY_LEN]);

impl BoxPublicKey {
    /// Create from raw bytes
    #[must_use]
    pub const fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// An X25519 secret key
///
/// Zeroized on drop. The device secret key is provisioned at manufacture
/// and lives only as long as a verification pass needs it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct BoxSecretKey([u8; KEY_LEN]);

impl BoxSecretKey {
    /// Create from raw bytes
    #[must_use]
    pub const fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive the matching public key
    #[must_use]
    pub fn public_key(&self) -> BoxPublicKey {
        let secret = StaticSecret::from(self.0);
        BoxPublicKey(*PublicKey::from(&secret).as_bytes())
    }
}

/// Derive the symmetric envelope key from an X25519 exchange
fn derive_key(secret: &BoxSecretKey, peer: &BoxPublicKey) -> CryptoResult<[u8; KEY_LEN]> {
    let sk = StaticSecret::from(secret.0);
    let shared = sk.diffie_hellman(&PublicKey::from(*peer.as_bytes()));
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidKey);
    }
    let mut hasher = Sha256::new();
    hasher.update(KDF_DOMAIN);
    hasher.update(shared.as_bytes());
    Ok(hasher.finalize().into())
}

/// Seal a plaintext into `out`
///
/// Used by the update server side and by test fixtures; the device only
/// ever opens envelopes. Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`CryptoError::BufferTooSmall`] if `out` cannot hold the
/// envelope, or [`CryptoError::InvalidKey`] if the exchange degenerates.
pub fn seal(
    plaintext: &[u8],
    nonce: &[u8; NONCE_LEN],
    recipient: &BoxPublicKey,
    sender: &BoxSecretKey,
    out: &mut [u8],
) -> CryptoResult<usize> {
    let total = sealed_len(plaintext.len());
    if out.len() < total {
        return Err(CryptoError::BufferTooSmall);
    }

    let mut key = derive_key(sender, recipient)?;
    let cipher = ChaCha20Poly1305::new((&key).into());
    key.zeroize();

    out[..NONCE_LEN].copy_from_slice(nonce);
    let (ct, rest) = out[NONCE_LEN..].split_at_mut(plaintext.len());
    ct.copy_from_slice(plaintext);
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), &[], ct)
        .map_err(|_| CryptoError::InternalError)?;
    rest[..TAG_LEN].copy_from_slice(&tag);
    Ok(total)
}

/// Open an envelope into `out`
///
/// Returns the plaintext length on success. On authentication failure
/// `out` is left cleared.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidCiphertext`] for a malformed envelope,
/// [`CryptoError::BufferTooSmall`] if `out` is too short, and
/// [`CryptoError::AuthenticationFailed`] if the tag does not verify.
pub fn open(
    envelope: &[u8],
    sender: &BoxPublicKey,
    recipient: &BoxSecretKey,
    out: &mut [u8],
) -> CryptoResult<usize> {
    if envelope.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::InvalidCiphertext);
    }
    let pt_len = envelope.len() - NONCE_LEN - TAG_LEN;
    if out.len() < pt_len {
        return Err(CryptoError::BufferTooSmall);
    }

    let mut key = derive_key(recipient, sender)?;
    let cipher = ChaCha20Poly1305::new((&key).into());
    key.zeroize();

    let nonce = Nonce::from_slice(&envelope[..NONCE_LEN]);
    let tag = Tag::from_slice(&envelope[NONCE_LEN + pt_len..]);
    let buf = &mut out[..pt_len];
    buf.copy_from_slice(&envelope[NONCE_LEN..NONCE_LEN + pt_len]);

    match cipher.decrypt_in_place_detached(nonce, &[], buf, tag) {
        Ok(()) => Ok(pt_len),
        Err(_) => {
            buf.zeroize();
            Err(CryptoError::AuthenticationFailed)
        }
    }
}
