// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A single ordered chunk of a document's content (spec §3/§4.7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
  pub sequence: u64,
  pub index: u64,
  pub offset: u64,
  pub jwe: Value,
}

/// The internal storage form of a [`Chunk`] (spec §4.7): the aggregate
/// `_id`, the owning vault and document ids, and the chunk itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(rename = "localEdvId")]
  pub local_edv_id: String,
  #[serde(rename = "docId")]
  pub doc_id: String,
  pub chunk: Chunk,
}
