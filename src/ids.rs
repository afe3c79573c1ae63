// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Vault, document, and secret identifiers.
//!
//! All three entity kinds share one wire format: 16 random bytes, stored and
//! exposed as `z` + base58(multihash(identity, 16, bytes)). A single [`Id`]
//! type backs all of them; [`VaultId`], [`DocumentId`], and [`SecretId`] are
//! aliases so call sites read naturally.

use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;

use crate::multibase::decode_identity_multihash;
use crate::multibase::encode_identity_multihash;
use crate::store::ConstraintError;

/// Number of random bytes backing every identifier in this crate.
const ID_LEN: usize = 16;

/// A `z`-base58, identity-multihash-encoded 16-byte random identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id(String);

/// Identifies a vault.
pub type VaultId = Id;
/// Identifies a document within a vault.
pub type DocumentId = Id;
/// Identifies a secret config. 1:1 with its vault's [`VaultId`].
pub type SecretId = Id;

impl Id {
  /// Generates a fresh random identifier.
  pub fn generate() -> Self {
    let mut bytes = [0u8; ID_LEN];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Self(encode_identity_multihash(&bytes))
  }

  /// Validates and wraps an externally supplied identifier string.
  ///
  /// Rejects anything that is not base58-encoded multibase, identity
  /// multihash array of exactly 16 bytes, per the stored identifier
  /// contract.
  pub fn parse(raw: impl Into<String>) -> Result<Self, ConstraintError> {
    let raw = raw.into();
    if decode_identity_multihash(&raw, ID_LEN).is_none() {
      return Err(ConstraintError::MalformedIdentifier(raw));
    }
    Ok(Self(raw))
  }

  /// Returns the encoded identifier string.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Id {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl TryFrom<String> for Id {
  type Error = ConstraintError;

  fn try_from(raw: String) -> Result<Self, Self::Error> {
    Self::parse(raw)
  }
}

impl From<Id> for String {
  fn from(id: Id) -> Self {
    id.0
  }
}

impl AsRef<str> for Id {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generated_ids_round_trip_through_parse() {
    let id = Id::generate();
    let parsed = Id::parse(id.as_str().to_owned()).unwrap();
    assert_eq!(id, parsed);
  }

  #[test]
  fn generated_ids_are_unique() {
    let a = Id::generate();
    let b = Id::generate();
    assert_ne!(a, b);
  }

  #[test]
  fn parse_rejects_malformed_identifier() {
    let err = Id::parse("not-an-id".to_owned()).unwrap_err();
    match err {
      ConstraintError::MalformedIdentifier(raw) => assert_eq!(raw, "not-an-id"),
      other => panic!("unexpected error variant: {other:?}"),
    }
  }

  #[test]
  fn parse_rejects_wrong_length_payload() {
    let wrong_length = encode_identity_multihash(&[1u8; 8]);
    assert!(Id::parse(wrong_length).is_err());
  }

  #[test]
  fn serializes_as_plain_string() {
    let id = Id::generate();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id.as_str()));
  }
}
