// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

/// A uniqueness constraint violation, carrying the colliding record so the
/// caller can decide how to react (translate to `DuplicateError`, compare
/// `_id`s to distinguish a sequence conflict from an attribute collision,
/// ...).
#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
pub enum ConstraintError {
  /// An externally supplied identifier did not match the stored identifier
  /// format (spec §6).
  #[error("Identifier \"{0}\" must be base58-encoded multibase, multihash array of 16 random bytes.")]
  MalformedIdentifier(String),

  /// A constraint selector matched an existing record.
  #[error("constraint violated by an existing record")]
  Violated { existing: Value },
}

impl ConstraintError {
  /// The `_id` of the colliding record, if this is a [`Self::Violated`].
  pub fn existing_id(&self) -> Option<&str> {
    match self {
      ConstraintError::Violated { existing } => existing.get("_id").and_then(Value::as_str),
      ConstraintError::MalformedIdentifier(_) => None,
    }
  }
}
