// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Per-vault metadata (spec §4.5): id, controller, sequence, and the key
//! references resolved against a [`SecretConfig`](crate::secrets::SecretConfig).

use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigRecord;
use crate::engine::Engine;
use crate::engine::FindQuery;
use crate::engine::Selector;
use crate::error::Error;
use crate::error::Result;
use crate::types::KeyReference;

/// Logical collection name for vault configs (spec §6).
pub const COLLECTION: &str = "edv-storage-config";
/// Secondary index over `controller`, maintained alongside the primary
/// `_id` index (spec §4.5).
pub const CONTROLLER_INDEX: &str = "config.controller";

/// A vault's persisted configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
  #[serde(rename = "_id")]
  pub id: String,
  pub controller: String,
  pub sequence: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hmac: Option<KeyReference>,
  #[serde(rename = "keyAgreementKey", skip_serializing_if = "Option::is_none")]
  pub key_agreement_key: Option<KeyReference>,
}

impl VaultConfig {
  pub fn new(id: impl Into<String>, controller: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      controller: controller.into(),
      sequence: 0,
      hmac: None,
      key_agreement_key: None,
    }
  }
}

impl ConfigRecord for VaultConfig {
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
    if self.sequence > (1u64 << 53) - 2 {
      return Err(Error::TypeError(
        "\"config.sequence\" must be a non-negative safe integer.".to_owned(),
      ));
    }
    Ok(())
  }
}

/// Looks up every vault config belonging to `controller`, using the
/// `config.controller` secondary index hint.
pub async fn find_by_controller(engine: &dyn Engine, controller: &str) -> Result<Vec<VaultConfig>> {
  let query = FindQuery::new(Selector::eq("controller", controller)).use_index("edv-config", CONTROLLER_INDEX);
  let hits = engine.find(COLLECTION, query).await.map_err(Error::Engine)?;
  hits
    .into_iter()
    .map(|record| serde_json::from_value(record.doc).map_err(|err| Error::Other(format!("failed to decode vault config: {err}"))))
    .collect()
}
