// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigRecord;
use crate::error::Error;
use crate::error::Result;
use crate::types::CipherVersion;

/// Fixed secret-config schema version. Only this version is defined (spec
/// Non-goals: no schema migration across cipher versions).
pub const SECRET_VERSION: &str = "1";

/// The wire shape of the `secret` field within a [`SecretConfig`]: the
/// salt and wrapped key material, encoded as identity-multihash strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMaterial {
  pub version: String,
  pub salt: String,
  #[serde(rename = "wrappedKey")]
  pub wrapped_key: String,
  #[serde(rename = "wrappedKeyAgreementKey", skip_serializing_if = "Option::is_none")]
  pub wrapped_key_agreement_key: Option<String>,
}

/// Password → salt+wrapped-key persisted record (spec §4.4). `id` equals
/// the owning vault's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(rename = "hmacId")]
  pub hmac_id: String,
  #[serde(rename = "keyAgreementKeyId")]
  pub key_agreement_key_id: String,
  pub secret: SecretMaterial,
  pub sequence: u64,
}

impl ConfigRecord for SecretConfig {
  fn id(&self) -> &str {
    &self.id
  }

  fn sequence(&self) -> u64 {
    self.sequence
  }

  fn validate(&self) -> Result<()> {
    if self.id.is_empty() {
      return Err(Error::TypeError("\"config.id\" must not be empty.".to_owned()));
    }
    if self.secret.version != SECRET_VERSION {
      return Err(Error::TypeError(format!(
        "unsupported secret config version \"{}\"",
        self.secret.version
      )));
    }
    Ok(())
  }
}

/// The result of unlocking a [`SecretConfig`]: the derived sub-keys plus
/// which cipher suite produced them.
pub struct UnlockedKeys {
  pub hmac: crate::crypto::Hmac,
  pub key_agreement: KeyAgreement,
  pub cipher_version: CipherVersion,
}

/// The unlocked key-agreement key, tagged by which cipher suite it came
/// from.
pub enum KeyAgreement {
  X25519(crate::crypto::X25519Kak),
  P256(crate::crypto::P256Kak),
}
