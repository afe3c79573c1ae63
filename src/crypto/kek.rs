// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crypto::ciphers::aes_kw::Aes256Kw;
use zeroize::Zeroize;

use super::error::CryptoError;
use super::error::Result;

const KEY_LENGTH: usize = 32;

/// A 256-bit AES Key Wrap (RFC 3394) key encryption key.
pub struct Kek {
  key: [u8; KEY_LENGTH],
}

impl Kek {
  /// Imports a raw 32-byte secret as a KEK.
  pub fn import(mut secret: [u8; KEY_LENGTH]) -> Self {
    let key = secret;
    secret.zeroize();
    Self { key }
  }

  /// Wraps `unwrapped_key`, returning the wrapped output (8 bytes longer than
  /// the input, per RFC 3394).
  pub fn wrap_key(&self, unwrapped_key: &[u8]) -> Result<Vec<u8>> {
    let kw = Aes256Kw::new(&self.key);
    let mut wrapped = vec![0u8; unwrapped_key.len() + 8];
    kw.wrap_key(unwrapped_key, &mut wrapped).map_err(CryptoError::Backend)?;
    Ok(wrapped)
  }

  /// Attempts to unwrap `wrapped_key`. Returns `None` on any failure
  /// (corrupted data or, in practice, a wrong password further up the
  /// call chain) — this call must never error, per spec §4.3/§7.
  pub fn unwrap_key(&self, wrapped_key: &[u8]) -> Option<Vec<u8>> {
    if wrapped_key.len() < 8 {
      return None;
    }
    let kw = Aes256Kw::new(&self.key);
    let mut unwrapped = vec![0u8; wrapped_key.len() - 8];
    kw.unwrap_key(wrapped_key, &mut unwrapped).ok()?;
    Some(unwrapped)
  }
}

impl Drop for Kek {
  fn drop(&mut self) {
    self.key.zeroize();
  }
}
