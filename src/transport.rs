// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The boundary between this crate and an external encryption core (spec
//! §6): the core only ever sees already-encrypted documents/chunks and
//! operates on them through this trait. [`LocalTransport`] is the concrete
//! implementation backing [`crate::client::PouchEdvClient`], layering it
//! over the document/chunk/config modules and the in-process purge
//! scheduler.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chunks;
use crate::chunks::Chunk;
use crate::chunks::ChunkRecord;
use crate::config::ConfigRepository;
use crate::documents;
use crate::documents::compile_query;
use crate::documents::EdvQuery;
use crate::documents::EncryptedDocument;
use crate::edv_config;
use crate::edv_config::VaultConfig;
use crate::engine::Engine;
use crate::error::Error;
use crate::error::Result;
use crate::purge::PurgeScheduler;

/// The outcome of a [`Transport::find`] call.
#[derive(Debug, Clone, Default)]
pub struct FindResult {
  pub documents: Vec<EncryptedDocument>,
  pub count: Option<usize>,
  pub has_more: bool,
}

/// Storage-side operations consumed by an external encryption core (spec
/// §6). Every method operates on already-encrypted payloads; content
/// encryption/decryption itself is out of scope for this crate.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn create_edv(&self, config: VaultConfig) -> Result<VaultConfig>;
  async fn get_config(&self, id: &str) -> Result<VaultConfig>;
  async fn update_config(&self, config: VaultConfig) -> Result<VaultConfig>;
  async fn insert(&self, encrypted: EncryptedDocument) -> Result<()>;
  async fn update(&self, encrypted: EncryptedDocument, deleted: bool) -> Result<()>;
  async fn get(&self, id: &str) -> Result<EncryptedDocument>;
  async fn find(&self, query: &EdvQuery) -> Result<FindResult>;
  async fn store_chunk(&self, doc_id: &str, chunk: Chunk) -> Result<ChunkRecord>;
  async fn get_chunk(&self, doc_id: &str, index: u64) -> Result<Chunk>;
}

/// A [`Transport`] backed directly by an [`Engine`], for a single vault.
/// `ConstraintError`s surfaced by the document/config layers are translated
/// to [`Error::Duplicate`] here, per the propagation policy in spec §7.
pub struct LocalTransport {
  edv_id: String,
  engine: Arc<dyn Engine>,
  purge: PurgeScheduler,
}

impl LocalTransport {
  pub fn new(engine: Arc<dyn Engine>, edv_id: impl Into<String>) -> Self {
    Self {
      edv_id: edv_id.into(),
      engine,
      purge: PurgeScheduler::new(),
    }
  }
}

fn duplicate_on_constraint<T>(result: Result<T>) -> Result<T> {
  match result {
    Err(Error::Constraint(err)) => Err(Error::duplicate_from_constraint(err)),
    other => other,
  }
}

#[async_trait]
impl Transport for LocalTransport {
  async fn create_edv(&self, config: VaultConfig) -> Result<VaultConfig> {
    let repo = ConfigRepository::<VaultConfig>::new(&*self.engine, edv_config::COLLECTION);
    duplicate_on_constraint(repo.insert(config).await)
  }

  async fn get_config(&self, id: &str) -> Result<VaultConfig> {
    ConfigRepository::<VaultConfig>::new(&*self.engine, edv_config::COLLECTION).get(id).await
  }

  async fn update_config(&self, config: VaultConfig) -> Result<VaultConfig> {
    ConfigRepository::<VaultConfig>::new(&*self.engine, edv_config::COLLECTION).update(config).await
  }

  async fn insert(&self, encrypted: EncryptedDocument) -> Result<()> {
    duplicate_on_constraint(documents::insert(&*self.engine, &self.edv_id, encrypted).await).map(drop)
  }

  async fn update(&self, encrypted: EncryptedDocument, deleted: bool) -> Result<()> {
    duplicate_on_constraint(documents::upsert(&*self.engine, &self.edv_id, encrypted, deleted).await)?;
    if deleted {
      self.purge.trigger(&*self.engine, documents::COLLECTION).await;
    }
    Ok(())
  }

  async fn get(&self, id: &str) -> Result<EncryptedDocument> {
    documents::get(&*self.engine, &self.edv_id, id).await.map(|record| record.doc)
  }

  async fn find(&self, query: &EdvQuery) -> Result<FindResult> {
    let compiled = compile_query(query)?;
    let records = documents::find(&*self.engine, &self.edv_id, compiled).await?;
    let documents: Vec<EncryptedDocument> = records.into_iter().map(|record| record.doc).collect();
    let count = query.count.unwrap_or(false).then(|| documents.len());
    Ok(FindResult {
      documents,
      count,
      has_more: false,
    })
  }

  async fn store_chunk(&self, doc_id: &str, chunk: Chunk) -> Result<ChunkRecord> {
    chunks::upsert(&*self.engine, &self.edv_id, doc_id, chunk).await
  }

  async fn get_chunk(&self, doc_id: &str, index: u64) -> Result<Chunk> {
    chunks::get(&*self.engine, &self.edv_id, doc_id, index).await.map(|record| record.chunk)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::engine::InMemoryEngine;

  fn doc(id: &str, sequence: u64) -> EncryptedDocument {
    EncryptedDocument {
      id: id.to_owned(),
      sequence,
      jwe: json!({"ciphertext": "..."}),
      indexed: None,
      meta: None,
    }
  }

  #[tokio::test]
  async fn insert_then_get_round_trips() {
    let engine: Arc<dyn Engine> = Arc::new(InMemoryEngine::new());
    let transport = LocalTransport::new(engine, "vault-1");
    transport.insert(doc("doc-1", 0)).await.unwrap();
    let fetched = transport.get("doc-1").await.unwrap();
    assert_eq!(fetched.sequence, 0);
  }

  #[tokio::test]
  async fn insert_duplicate_id_surfaces_as_duplicate_error() {
    let engine: Arc<dyn Engine> = Arc::new(InMemoryEngine::new());
    let transport = LocalTransport::new(engine, "vault-1");
    transport.insert(doc("doc-1", 0)).await.unwrap();
    let err = transport.insert(doc("doc-1", 0)).await.unwrap_err();
    assert!(matches!(err, Error::Duplicate(_)));
  }

  #[tokio::test]
  async fn update_with_deleted_purges_the_tombstone() {
    let engine: Arc<dyn Engine> = Arc::new(InMemoryEngine::new());
    let transport = LocalTransport::new(engine.clone(), "vault-1");
    transport.insert(doc("doc-1", 0)).await.unwrap();
    transport.update(doc("doc-1", 1), true).await.unwrap();

    let raw = engine.get(documents::COLLECTION, "vault-1:doc-1").await.unwrap();
    assert!(raw.is_none());
  }

  #[tokio::test]
  async fn store_chunk_then_get_chunk_round_trips() {
    let engine: Arc<dyn Engine> = Arc::new(InMemoryEngine::new());
    let transport = LocalTransport::new(engine, "vault-1");
    transport.insert(doc("doc-1", 0)).await.unwrap();

    let chunk = Chunk {
      sequence: 0,
      index: 0,
      offset: 0,
      jwe: json!({"ciphertext": "chunk"}),
    };
    transport.store_chunk("doc-1", chunk.clone()).await.unwrap();
    let fetched = transport.get_chunk("doc-1", 0).await.unwrap();
    assert_eq!(fetched, chunk);
  }
}
