// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use p256::SecretKey;
use zeroize::Zeroize;

use super::error::CryptoError;
use super::error::Result;

/// Raw secret-key length, in bytes.
const SECRET_LEN: usize = 32;
/// Raw compressed public-key length, in bytes.
const PUBLIC_LEN: usize = 33;
/// Length of the zero-padded buffer the pair is serialized into before
/// wrapping (`32 + 33 + 7` trailing zero bytes).
pub const RAW_LEN: usize = 72;

/// A P-256 (NIST) ECDH key-agreement key, used by the `"fips"` cipher suite.
pub struct P256Kak {
  secret: SecretKey,
  public: PublicKey,
}

impl P256Kak {
  /// The verification-method type recorded alongside the key reference.
  pub const TYPE: &'static str = "Multikey";

  /// Generates a fresh random P-256 key pair.
  pub fn generate() -> Self {
    let secret = SecretKey::random(&mut rand::rngs::OsRng);
    let public = secret.public_key();
    Self { secret, public }
  }

  /// Reconstructs a key pair from its raw 32-byte secret scalar and 33-byte
  /// compressed public point.
  pub fn import(secret_key: &[u8; SECRET_LEN], public_key: &[u8; PUBLIC_LEN]) -> Result<Self> {
    let secret = SecretKey::from_slice(secret_key).map_err(|_| CryptoError::InvalidKeyLength {
      expected: SECRET_LEN,
      actual: secret_key.len(),
    })?;
    let public = PublicKey::from_sec1_bytes(public_key).map_err(|_| CryptoError::InvalidKeyLength {
      expected: PUBLIC_LEN,
      actual: public_key.len(),
    })?;
    Ok(Self { secret, public })
  }

  /// Derives the shared secret with `public_key` via P-256 ECDH.
  pub fn derive_secret(&self, public_key: &PublicKey) -> [u8; 32] {
    let shared = diffie_hellman(self.secret.to_nonzero_scalar(), public_key.as_affine());
    let mut out = [0u8; 32];
    out.copy_from_slice(shared.raw_secret_bytes().as_slice());
    out
  }

  /// Assembles the 72-byte zero-padded raw form used for wrapping: 32 secret
  /// bytes, followed by the 33-byte compressed public key, followed by 7
  /// zero bytes.
  pub fn to_raw_padded(&self) -> [u8; RAW_LEN] {
    let mut buf = [0u8; RAW_LEN];
    let mut secret_bytes = self.secret.to_bytes();
    buf[..SECRET_LEN].copy_from_slice(secret_bytes.as_slice());
    secret_bytes.zeroize();
    let encoded = self.public.to_encoded_point(true);
    buf[SECRET_LEN..SECRET_LEN + PUBLIC_LEN].copy_from_slice(encoded.as_bytes());
    buf
  }

  /// Reconstructs a key pair from the 72-byte zero-padded raw form.
  pub fn from_raw_padded(buf: &[u8; RAW_LEN]) -> Result<Self> {
    let secret_key: [u8; SECRET_LEN] = buf[..SECRET_LEN].try_into().unwrap();
    let public_key: [u8; PUBLIC_LEN] = buf[SECRET_LEN..SECRET_LEN + PUBLIC_LEN].try_into().unwrap();
    Self::import(&secret_key, &public_key)
  }

  /// Returns the public key.
  pub fn public_key(&self) -> &PublicKey {
    &self.public
  }
}
