// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::types::KeyReference;

/// A single blinded attribute attached to an [`IndexedEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
  pub name: String,
  pub value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub unique: Option<bool>,
}

impl Attribute {
  pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      value: value.into(),
      unique: None,
    }
  }

  pub fn unique(mut self) -> Self {
    self.unique = Some(true);
    self
  }
}

/// A group of blinded attributes indexed under one HMAC key reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEntry {
  pub hmac: KeyReference,
  pub sequence: u64,
  pub attributes: Vec<Attribute>,
}

/// The caller-facing encrypted document (spec §3): opaque ciphertext plus
/// blinded, already-HMACed index attributes. Content encryption itself is
/// out of scope; this crate only stores and indexes the `jwe` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDocument {
  pub id: String,
  pub sequence: u64,
  pub jwe: Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub indexed: Option<Vec<IndexedEntry>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub meta: Option<Value>,
}

/// The internal storage form of an [`EncryptedDocument`] (spec §4.6): the
/// aggregate `_id`, the owning vault id, the document itself, and the three
/// derived attribute arrays used by the secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(rename = "localEdvId")]
  pub local_edv_id: String,
  pub doc: EncryptedDocument,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub attributes: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none", rename = "attributeNames")]
  pub attribute_names: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none", rename = "uniqueAttributes")]
  pub unique_attributes: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none", rename = "_deleted")]
  pub deleted: Option<bool>,
}
