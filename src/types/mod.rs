// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Shared value types threaded through the vault/secret config records and
//! the client surface.

use serde::Deserialize;
use serde::Serialize;

/// A reference to a key living in a secret config: `{id, type}`. Used by the
/// vault config's `hmac` and `keyAgreementKey` fields — the actual key
/// material never appears here, only its identifier and verification-method
/// type string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyReference {
  pub id: String,
  #[serde(rename = "type")]
  pub type_: String,
}

impl KeyReference {
  pub fn new(id: impl Into<String>, type_: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      type_: type_.into(),
    }
  }
}

/// Which key-agreement key type a secret config was generated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherVersion {
  /// X25519 key agreement (the default).
  Recommended,
  /// P-256 key agreement (FIPS 140-2 compliant primitives only).
  Fips,
}

impl CipherVersion {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Recommended => "recommended",
      Self::Fips => "fips",
    }
  }
}

impl Default for CipherVersion {
  fn default() -> Self {
    Self::Recommended
  }
}

impl std::fmt::Display for CipherVersion {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cipher_version_round_trips_through_json() {
    let recommended = serde_json::to_string(&CipherVersion::Recommended).unwrap();
    assert_eq!(recommended, "\"recommended\"");
    let fips: CipherVersion = serde_json::from_str("\"fips\"").unwrap();
    assert_eq!(fips, CipherVersion::Fips);
  }

  #[test]
  fn key_reference_serializes_with_type_field() {
    let reference = KeyReference::new("urn:hmac:1", "Sha256HmacKey2019");
    let json = serde_json::to_value(&reference).unwrap();
    assert_eq!(json["type"], "Sha256HmacKey2019");
    assert_eq!(json["id"], "urn:hmac:1");
  }
}
