// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A reusable repository for identified, sequence-gated configuration
//! records (spec §4.2). Vault configs and secret configs are both instances
//! of this shape, parameterized over collection name and the record type.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::engine::Engine;
use crate::engine::FindQuery;
use crate::engine::Selector;
use crate::error::Error;
use crate::error::Result;
use crate::store;

/// A configuration record managed by a [`ConfigRepository`]: identified,
/// sequence-gated, and self-validating.
pub trait ConfigRecord: Serialize + DeserializeOwned + Clone {
  /// The record's stable identifier (`_id` in storage).
  fn id(&self) -> &str;
  /// The record's current sequence number.
  fn sequence(&self) -> u64;
  /// Shape validation beyond what serde already enforces.
  fn validate(&self) -> Result<()>;
}

fn decode_error(context: &'static str, err: serde_json::Error) -> Error {
  Error::Other(format!("{context}: {err}"))
}

/// A generic repository over identified configurations, backed by an
/// [`Engine`] collection.
pub struct ConfigRepository<'engine, T> {
  engine: &'engine dyn Engine,
  collection: &'static str,
  _marker: PhantomData<fn() -> T>,
}

impl<'engine, T: ConfigRecord> ConfigRepository<'engine, T> {
  pub fn new(engine: &'engine dyn Engine, collection: &'static str) -> Self {
    Self {
      engine,
      collection,
      _marker: PhantomData,
    }
  }

  /// Inserts a brand-new configuration. Requires `config.sequence() == 0`.
  pub async fn insert(&self, config: T) -> Result<T> {
    config.validate()?;
    if config.sequence() != 0 {
      return Err(Error::TypeError(
        "\"config.sequence\" must be 0 when inserting a new configuration.".to_owned(),
      ));
    }

    let doc = serde_json::to_value(&config).map_err(|err| decode_error("failed to encode configuration", err))?;
    store::insert_one(self.engine, self.collection, doc, Vec::new()).await?;
    Ok(config)
  }

  /// Updates an existing configuration. The update only succeeds if a
  /// record with `_id == config.id()` and `sequence == config.sequence() -
  /// 1` currently exists.
  pub async fn update(&self, config: T) -> Result<T> {
    config.validate()?;

    // `config.sequence() == 0` can never match a stored sequence (which is
    // always non-negative), so it falls through to the `InvalidState` error
    // below instead of being special-cased here.
    let previous_sequence: serde_json::Value = match config.sequence().checked_sub(1) {
      Some(previous) => json!(previous),
      None => json!(-1i64),
    };

    let selector = Selector::Eq(vec![
      ("_id".to_owned(), json!(config.id())),
      ("sequence".to_owned(), previous_sequence),
    ]);
    let doc = serde_json::to_value(&config).map_err(|err| decode_error("failed to encode configuration", err))?;

    let updated = store::update_one(self.engine, self.collection, selector, doc, false, Vec::new()).await?;
    updated.ok_or_else(|| {
      Error::InvalidState("Could not update configuration. Sequence does not match or configuration does not exist.".to_owned())
    })?;
    Ok(config)
  }

  /// Fetches a configuration by id.
  pub async fn get(&self, id: &str) -> Result<T> {
    let hits = self
      .engine
      .find(self.collection, FindQuery::new(Selector::eq("_id", id)).limit(1))
      .await
      .map_err(Error::Engine)?;
    let record = hits
      .into_iter()
      .next()
      .ok_or_else(|| Error::NotFound("Configuration not found.".to_owned()))?;
    serde_json::from_value(record.doc).map_err(|err| decode_error("failed to decode configuration", err))
  }
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;

  use super::*;
  use crate::engine::InMemoryEngine;

  #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
  struct TestConfig {
    #[serde(rename = "_id")]
    id: String,
    sequence: u64,
    controller: String,
  }

  impl ConfigRecord for TestConfig {
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
      Ok(())
    }
  }

  #[tokio::test]
  async fn insert_then_get_round_trips() {
    let engine = InMemoryEngine::new();
    let repo = ConfigRepository::<TestConfig>::new(&engine, "test-config");
    let config = TestConfig {
      id: "a".to_owned(),
      sequence: 0,
      controller: "urn:controller".to_owned(),
    };
    repo.insert(config.clone()).await.unwrap();
    let fetched = repo.get("a").await.unwrap();
    assert_eq!(fetched, config);
  }

  #[tokio::test]
  async fn insert_rejects_nonzero_sequence() {
    let engine = InMemoryEngine::new();
    let repo = ConfigRepository::<TestConfig>::new(&engine, "test-config");
    let config = TestConfig {
      id: "a".to_owned(),
      sequence: 1,
      controller: "urn:controller".to_owned(),
    };
    assert!(matches!(repo.insert(config).await, Err(Error::TypeError(_))));
  }

  #[tokio::test]
  async fn update_requires_matching_previous_sequence() {
    let engine = InMemoryEngine::new();
    let repo = ConfigRepository::<TestConfig>::new(&engine, "test-config");
    let config = TestConfig {
      id: "a".to_owned(),
      sequence: 0,
      controller: "urn:controller".to_owned(),
    };
    repo.insert(config.clone()).await.unwrap();

    let stale = TestConfig {
      sequence: 5,
      ..config.clone()
    };
    assert!(matches!(repo.update(stale).await, Err(Error::InvalidState(_))));

    let next = TestConfig {
      sequence: 1,
      controller: "urn:controller2".to_owned(),
      ..config
    };
    let updated = repo.update(next.clone()).await.unwrap();
    assert_eq!(updated, next);
  }

  #[tokio::test]
  async fn update_rejects_sequence_zero_against_existing_record() {
    let engine = InMemoryEngine::new();
    let repo = ConfigRepository::<TestConfig>::new(&engine, "test-config");
    let config = TestConfig {
      id: "a".to_owned(),
      sequence: 0,
      controller: "urn:controller".to_owned(),
    };
    repo.insert(config.clone()).await.unwrap();

    // sequence 0 can never match an existing record's stored sequence, so
    // this is an `InvalidState` error rather than an insert-as-new path.
    assert!(matches!(repo.update(config).await, Err(Error::InvalidState(_))));
  }

  #[tokio::test]
  async fn get_missing_yields_not_found() {
    let engine = InMemoryEngine::new();
    let repo = ConfigRepository::<TestConfig>::new(&engine, "test-config");
    assert!(matches!(repo.get("missing").await, Err(Error::NotFound(_))));
  }
}
