// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur when working with the EDV storage engine.
//!
//! The taxonomy mirrors the discriminants called out by the specification:
//! [`TypeError`](Error::TypeError) for malformed arguments, [`ConstraintError`]
//! for uniqueness violations, [`Error::Duplicate`] for transport-level
//! duplicates, [`Error::InvalidState`] for sequence-gated update failures, and
//! [`Error::NotFound`] for missing records. Password-unwrap failure is
//! deliberately *not* a variant here: per the spec it must surface as a plain
//! `None` return from [`crate::secrets::decrypt`], never as an error.

use crate::store::ConstraintError;

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T, E = Error> = ::core::result::Result<T, E>;

/// All possible errors that can occur in this crate.
#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
pub enum Error {
  /// An argument's shape or type was invalid. Fails fast; never retried.
  #[error("{0}")]
  TypeError(String),

  /// A uniqueness constraint (identifier or blinded attribute) was violated.
  #[error(transparent)]
  Constraint(#[from] ConstraintError),

  /// A transport-level duplicate was detected (e.g. a duplicate vault id).
  #[error("{0}")]
  Duplicate(String),

  /// A sequence-gated update failed because the expected sequence was stale,
  /// or the targeted record did not exist.
  #[error("{0}")]
  InvalidState(String),

  /// The requested record does not exist.
  #[error("{0}")]
  NotFound(String),

  /// Caused by errors from the [`crypto`][crate::crypto] module.
  #[error(transparent)]
  Crypto(#[from] crate::crypto::CryptoError),

  /// Caused by errors from the underlying document engine.
  #[error(transparent)]
  Engine(#[from] crate::engine::EngineError),

  /// Caused by attempting to read a poisoned shared resource.
  #[error("shared resource poisoned: read")]
  SharedReadPoisoned,

  /// Caused by attempting to write a poisoned shared resource.
  #[error("shared resource poisoned: write")]
  SharedWritePoisoned,

  /// Any other plain-message error (invalid password, unsupported secret
  /// version, corrupted stored key, ...).
  #[error("{0}")]
  Other(String),
}

impl Error {
  /// Maps a [`ConstraintError`] raised at the transport boundary to a
  /// [`Error::Duplicate`], per the propagation policy in spec §7.
  pub fn duplicate_from_constraint(err: ConstraintError) -> Self {
    Error::Duplicate(err.to_string())
  }
}
