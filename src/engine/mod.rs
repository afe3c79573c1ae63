// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The local document engine contract (spec §6) and an in-memory reference
//! implementation used by tests and as a runnable default.
//!
//! Everything above this module (store primitives, config repository,
//! documents, chunks) is written against the [`Engine`] trait only; no
//! caller assumes anything about how selectors are evaluated or how `_rev`
//! is generated.

mod error;
mod memory;
mod selector;

pub use self::error::EngineError;
pub use self::memory::InMemoryEngine;
pub use self::selector::Selector;

use serde_json::Value;

/// Result alias for engine operations.
pub type Result<T, E = EngineError> = ::core::result::Result<T, E>;

/// A single stored record: its `_id`, its current `_rev`, and the document
/// body (which itself also carries `_id`/`_rev` once serialized, mirroring
/// the underlying engine's envelope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
  pub id: String,
  pub rev: String,
  pub doc: Value,
}

/// A `find` query: a selector, an optional result cap, and an optional
/// index hint (`(design_doc, index_name)`), which the in-memory engine
/// ignores but a real indexed backend would use to plan the scan.
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
  pub selector: Selector,
  pub limit: Option<usize>,
  pub use_index: Option<(String, String)>,
}

impl FindQuery {
  pub fn new(selector: Selector) -> Self {
    Self {
      selector,
      limit: None,
      use_index: None,
    }
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn use_index(mut self, design_doc: impl Into<String>, index: impl Into<String>) -> Self {
    self.use_index = Some((design_doc.into(), index.into()));
    self
  }
}

/// The contract a local KV/document engine must satisfy. Collections are
/// addressed by logical name (`edv-storage-doc`, ...); an implementation
/// MAY prefix physical names but must preserve these logical ones at the
/// call boundary (spec §6).
#[async_trait::async_trait]
pub trait Engine: Send + Sync {
  /// Writes `doc` under its own `_id`/`_rev`. Fails with
  /// [`EngineError::Conflict`] if `_rev` does not match the currently
  /// stored revision (or if the document does not exist and `_rev` is
  /// set).
  async fn put(&self, collection: &str, doc: Value) -> Result<Record>;

  /// Writes `doc` under a server-chosen `_id`. Always succeeds (baring a
  /// backend failure) since there is nothing to conflict with.
  async fn post(&self, collection: &str, doc: Value) -> Result<Record>;

  /// Fetches the record with the given `_id`, if any.
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>>;

  /// Executes a selector-based query, returning records in unspecified
  /// order unless the selector shape implies an order.
  async fn find(&self, collection: &str, query: FindQuery) -> Result<Vec<Record>>;

  /// Permanently removes the record with the given `_id`, if any. Used only
  /// by the purge sweep; application code tombstones records via `put`
  /// instead of calling this directly.
  async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}
