// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crypto::keys::pbkdf::PBKDF2_HMAC_SHA256;
use rand::RngCore;

use super::error::CryptoError;
use super::error::Result;

/// Fixed PBKDF2 iteration count for secret config version `"1"`.
pub const ITERATIONS: usize = 100_000;
/// Fixed salt size, in bytes.
pub const SALT_SIZE: usize = 16;

/// Options for [`derive_bits`]. Mirrors the `deriveBits` call shape from
/// spec §4.3, reified as an explicit parameter record per spec §9.
pub struct Pbkdf2Options<'a> {
  pub bit_length: usize,
  pub iterations: usize,
  pub password: &'a str,
  pub salt: Option<[u8; SALT_SIZE]>,
}

impl<'a> Pbkdf2Options<'a> {
  pub fn new(password: &'a str) -> Self {
    Self {
      bit_length: 256,
      iterations: ITERATIONS,
      password,
      salt: None,
    }
  }
}

/// The result of a [`derive_bits`] call: the salt actually used (generated
/// if not supplied) and the derived key material.
pub struct DerivedBits {
  pub salt: [u8; SALT_SIZE],
  pub derived_bits: Vec<u8>,
}

/// PBKDF2-HMAC-SHA-256 key derivation over a UTF-8-encoded password.
pub fn derive_bits(opts: Pbkdf2Options<'_>) -> Result<DerivedBits> {
  if opts.bit_length % 8 != 0 {
    return Err(CryptoError::InvalidKeyLength {
      expected: 0,
      actual: opts.bit_length,
    });
  }

  let salt = opts.salt.unwrap_or_else(|| {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
  });

  let mut derived_bits = vec![0u8; opts.bit_length / 8];
  PBKDF2_HMAC_SHA256(opts.password.as_bytes(), &salt, opts.iterations, &mut derived_bits)
    .map_err(CryptoError::Backend)?;

  Ok(DerivedBits { salt, derived_bits })
}
