// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use x25519_dalek::PublicKey;
use x25519_dalek::StaticSecret;
use zeroize::Zeroize;

use crate::multibase::encode_multibase;

/// Multicodec varint header for an X25519 public key (`0xec01`).
const MULTICODEC_PUBLIC: [u8; 2] = [0xec, 0x01];
/// Multicodec varint header for an X25519 private key (`0x1302`).
const MULTICODEC_PRIVATE: [u8; 2] = [0x82, 0x26];

/// An X25519 (Curve25519 Diffie-Hellman) key-agreement key, used by the
/// `"recommended"` cipher suite.
pub struct X25519Kak {
  secret: StaticSecret,
  public: PublicKey,
}

impl X25519Kak {
  /// The verification-method type recorded alongside the key reference.
  pub const TYPE: &'static str = "X25519KeyAgreementKey2020";

  /// Reconstructs a key pair from a 32-byte raw secret scalar.
  pub fn import(mut secret: [u8; 32]) -> Self {
    let static_secret = StaticSecret::from(secret);
    secret.zeroize();
    let public = PublicKey::from(&static_secret);
    Self {
      secret: static_secret,
      public,
    }
  }

  /// Derives the shared secret with `public_key` via X25519 scalar
  /// multiplication.
  pub fn derive_secret(&self, public_key: &[u8; 32]) -> [u8; 32] {
    let their_public = PublicKey::from(*public_key);
    self.secret.diffie_hellman(&their_public).to_bytes()
  }

  /// Returns the raw public key bytes.
  pub fn public_key_bytes(&self) -> [u8; 32] {
    self.public.to_bytes()
  }

  /// Exports the public key as a `publicKeyMultibase` string, prefixed with
  /// the X25519 public-key multicodec header.
  pub fn public_key_multibase(&self) -> String {
    encode_multibase(&MULTICODEC_PUBLIC, &self.public.to_bytes())
  }

  /// Exports the private key as a multibase string, prefixed with the
  /// X25519 private-key multicodec header. Callers must treat the result as
  /// secret material.
  pub fn private_key_multibase(&self) -> String {
    encode_multibase(&MULTICODEC_PRIVATE, &self.secret.to_bytes())
  }
}
