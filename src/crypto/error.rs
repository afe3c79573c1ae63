// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the cryptographic primitive wrappers.

/// Alias for a `Result` with the error type [`CryptoError`].
pub type Result<T, E = CryptoError> = ::core::result::Result<T, E>;

/// Errors surfaced by [`crate::crypto`]'s primitive wrappers.
///
/// Note: key-unwrap failure (wrong password) is *not* represented here. Per
/// spec §4.3/§7, [`crate::crypto::Kek::unwrap_key`] returns `Option<Vec<u8>>`
/// and never produces an `Err` for a failed unwrap.
#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
pub enum CryptoError {
  /// Caused by errors from the [`iota_crypto`](crypto) backend.
  #[error("cryptographic primitive failed: {0}")]
  Backend(#[from] crypto::Error),
  /// A key or derived secret had an unexpected byte length.
  #[error("invalid key length: expected {expected}, got {actual}")]
  InvalidKeyLength { expected: usize, actual: usize },
  /// A stored secret failed to decode from its multibase/multihash envelope.
  #[error("malformed stored key material: {0}")]
  Encoding(String),
}
