// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Per-document ordered chunk storage (spec §4.7): `{sequence, index, offset,
//! jwe}` records keyed on `(vault, doc, chunk-index)`, gated on the chunk's
//! sequence matching its document's sequence at write time.

mod types;

pub use self::types::Chunk;
pub use self::types::ChunkRecord;

use crate::documents;
use crate::engine::Engine;
use crate::engine::FindQuery;
use crate::engine::Selector;
use crate::error::Error;
use crate::error::Result;
use crate::store;

/// Logical collection name for chunks (spec §6).
pub const COLLECTION: &str = "edv-storage-chunk";

fn record_id(edv_id: &str, doc_id: &str, index: u64) -> String {
  format!("{edv_id}:{doc_id}:{index}")
}

fn to_json(record: &ChunkRecord) -> Result<serde_json::Value> {
  serde_json::to_value(record).map_err(|err| Error::Other(format!("failed to encode document chunk: {err}")))
}

fn from_json(value: serde_json::Value) -> Result<ChunkRecord> {
  serde_json::from_value(value).map_err(|err| Error::Other(format!("failed to decode document chunk: {err}")))
}

/// Upserts `chunk` for `(edv_id, doc_id)`, after checking that
/// `chunk.sequence` matches the associated document's current sequence. A
/// `ConstraintError` referring to this chunk's own `_id` is treated as a
/// benign concurrent upsert: the existing record is fetched and returned
/// instead of propagating the error.
pub async fn upsert(engine: &dyn Engine, edv_id: &str, doc_id: &str, chunk: Chunk) -> Result<ChunkRecord> {
  let doc = documents::get(engine, edv_id, doc_id).await?;
  if chunk.sequence != doc.doc.sequence {
    return Err(Error::InvalidState(format!(
      "Could not update document chunk. Sequence does not match the associated document. expected={}, actual={}",
      doc.doc.sequence, chunk.sequence
    )));
  }

  let id = record_id(edv_id, doc_id, chunk.index);
  let record = ChunkRecord {
    id: id.clone(),
    local_edv_id: edv_id.to_owned(),
    doc_id: doc_id.to_owned(),
    chunk,
  };

  let json = to_json(&record)?;
  match store::update_one(engine, COLLECTION, Selector::eq("_id", id.clone()), json, true, vec![]).await {
    Ok(_) => Ok(record),
    Err(Error::Constraint(err)) if err.existing_id() == Some(id.as_str()) => get_by_id(engine, &id).await,
    Err(other) => Err(other),
  }
}

async fn get_by_id(engine: &dyn Engine, id: &str) -> Result<ChunkRecord> {
  let hits = engine
    .find(COLLECTION, FindQuery::new(Selector::eq("_id", id)).limit(1))
    .await
    .map_err(Error::Engine)?;
  let record = hits
    .into_iter()
    .next()
    .ok_or_else(|| Error::NotFound("Document chunk not found.".to_owned()))?;
  from_json(record.doc)
}

/// Fetches chunk `index` of `(edv_id, doc_id)`.
pub async fn get(engine: &dyn Engine, edv_id: &str, doc_id: &str, index: u64) -> Result<ChunkRecord> {
  get_by_id(engine, &record_id(edv_id, doc_id, index)).await
}

/// Marks chunk `index` of `(edv_id, doc_id)` as deleted (tombstoned). The
/// caller is responsible for scheduling a purge sweep afterwards. Returns
/// `true` if a record was found (and possibly already tombstoned), `false`
/// if it was already purged or never existed.
pub async fn remove(engine: &dyn Engine, edv_id: &str, doc_id: &str, index: u64) -> Result<bool> {
  let id = record_id(edv_id, doc_id, index);
  let existing = engine.get(COLLECTION, &id).await.map_err(Error::Engine)?;
  let Some(existing) = existing else {
    return Ok(false);
  };

  let mut doc = existing.doc;
  if let serde_json::Value::Object(map) = &mut doc {
    map.insert("_deleted".to_owned(), true.into());
  }
  engine.put(COLLECTION, doc).await.map_err(Error::Engine)?;
  Ok(true)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::documents::EncryptedDocument;
  use crate::engine::InMemoryEngine;

  async fn seed_document(engine: &dyn Engine, edv_id: &str, id: &str, sequence: u64) {
    documents::insert(
      engine,
      edv_id,
      EncryptedDocument {
        id: id.to_owned(),
        sequence,
        jwe: json!({"ciphertext": "..."}),
        indexed: None,
        meta: None,
      },
    )
    .await
    .unwrap();
  }

  #[tokio::test]
  async fn upsert_then_get_round_trips() {
    let engine = InMemoryEngine::new();
    seed_document(&engine, "vault-1", "doc-1", 1).await;

    let chunk = Chunk {
      sequence: 1,
      index: 0,
      offset: 0,
      jwe: json!({"ciphertext": "chunk-0"}),
    };
    upsert(&engine, "vault-1", "doc-1", chunk.clone()).await.unwrap();

    let fetched = get(&engine, "vault-1", "doc-1", 0).await.unwrap();
    assert_eq!(fetched.chunk, chunk);
  }

  #[tokio::test]
  async fn upsert_rejects_sequence_mismatch() {
    let engine = InMemoryEngine::new();
    seed_document(&engine, "vault-1", "doc-1", 2).await;

    let chunk = Chunk {
      sequence: 1,
      index: 0,
      offset: 0,
      jwe: json!({}),
    };
    let err = upsert(&engine, "vault-1", "doc-1", chunk).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
  }

  #[tokio::test]
  async fn get_missing_chunk_returns_not_found() {
    let engine = InMemoryEngine::new();
    seed_document(&engine, "vault-1", "doc-1", 1).await;
    let err = get(&engine, "vault-1", "doc-1", 9).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
  }

  #[tokio::test]
  async fn remove_tombstones_existing_chunk_and_is_idempotent_until_purged() {
    let engine = InMemoryEngine::new();
    seed_document(&engine, "vault-1", "doc-1", 1).await;
    let chunk = Chunk {
      sequence: 1,
      index: 0,
      offset: 0,
      jwe: json!({}),
    };
    upsert(&engine, "vault-1", "doc-1", chunk).await.unwrap();

    assert!(remove(&engine, "vault-1", "doc-1", 0).await.unwrap());
    // Tombstone is still present (not yet purged), so it is found again.
    assert!(remove(&engine, "vault-1", "doc-1", 0).await.unwrap());
  }

  #[tokio::test]
  async fn remove_missing_chunk_returns_false() {
    let engine = InMemoryEngine::new();
    seed_document(&engine, "vault-1", "doc-1", 1).await;
    assert!(!remove(&engine, "vault-1", "doc-1", 9).await.unwrap());
  }
}
