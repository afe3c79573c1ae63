// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crypto::macs::hmac::HMAC_SHA256;
use zeroize::Zeroize;

use super::error::CryptoError;
use super::error::Result;

const KEY_LENGTH: usize = 32;
const TAG_LENGTH: usize = 32;

/// A 256-bit HMAC-SHA-256 key, algorithm label `HS256`
/// (`Sha256HmacKey2019` in the stored reference type).
pub struct Hmac {
  key: [u8; KEY_LENGTH],
}

impl Hmac {
  /// JWA-style algorithm label.
  pub const ALGORITHM: &'static str = "HS256";
  /// The verification-method type recorded alongside the key reference.
  pub const TYPE: &'static str = "Sha256HmacKey2019";

  /// Generates a fresh random 32-byte HMAC key.
  pub fn generate() -> Self {
    let mut key = [0u8; KEY_LENGTH];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut key);
    Self { key }
  }

  /// Imports a raw 32-byte HMAC key.
  pub fn import(mut secret: [u8; KEY_LENGTH]) -> Self {
    let key = secret;
    secret.zeroize();
    Self { key }
  }

  /// Signs `data`, returning the 32-byte authentication tag.
  pub fn sign(&self, data: &[u8]) -> Result<[u8; TAG_LENGTH]> {
    let mut tag = [0u8; TAG_LENGTH];
    HMAC_SHA256(data, &self.key, &mut tag).map_err(CryptoError::Backend)?;
    Ok(tag)
  }

  /// Verifies that `tag` is the correct HMAC of `data`.
  pub fn verify(&self, data: &[u8], tag: &[u8]) -> Result<bool> {
    let expected = self.sign(data)?;
    Ok(subtle_eq(&expected, tag))
  }

  /// Returns the raw key bytes. Callers must zeroize the returned buffer
  /// after use.
  pub fn raw_bytes(&self) -> &[u8; KEY_LENGTH] {
    &self.key
  }
}

impl Drop for Hmac {
  fn drop(&mut self) {
    self.key.zeroize();
  }
}

/// Constant-time byte slice comparison. `tag` is attacker-controlled input
/// (a stored or supplied MAC); length is not secret so only the scan over
/// common bytes needs to be constant-time.
fn subtle_eq(expected: &[u8], tag: &[u8]) -> bool {
  if expected.len() != tag.len() {
    return false;
  }
  let mut diff = 0u8;
  for (a, b) in expected.iter().zip(tag.iter()) {
    diff |= a ^ b;
  }
  diff == 0
}
