// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use hashbrown::HashMap;
use serde_json::Value;
use uuid::Uuid;

use super::EngineError;
use super::FindQuery;
use super::Record;
use super::Result;
use crate::utils::Shared;

/// An in-memory reference [`Engine`](super::Engine), grouping records by
/// collection name. Revisions are opaque random tokens; there is no
/// durability beyond the process lifetime.
#[derive(Default)]
pub struct InMemoryEngine {
  collections: Shared<HashMap<String, HashMap<String, Record>>>,
}

impl InMemoryEngine {
  pub fn new() -> Self {
    Self::default()
  }

  fn fresh_rev() -> String {
    Uuid::new_v4().to_string()
  }

  fn doc_id(doc: &Value) -> Option<String> {
    doc.get("_id").and_then(Value::as_str).map(str::to_owned)
  }

  fn doc_rev(doc: &Value) -> Option<String> {
    doc.get("_rev").and_then(Value::as_str).map(str::to_owned)
  }

  fn stamp(mut doc: Value, id: &str, rev: &str) -> Value {
    if let Value::Object(map) = &mut doc {
      map.insert("_id".to_owned(), Value::String(id.to_owned()));
      map.insert("_rev".to_owned(), Value::String(rev.to_owned()));
    }
    doc
  }

  fn lock_poisoned() -> EngineError {
    EngineError::Backend("in-memory engine lock poisoned".to_owned())
  }
}

#[async_trait::async_trait]
impl super::Engine for InMemoryEngine {
  async fn put(&self, collection: &str, doc: Value) -> Result<Record> {
    let id = Self::doc_id(&doc).ok_or_else(|| EngineError::Backend("put requires \"_id\"".to_owned()))?;
    let given_rev = Self::doc_rev(&doc);

    let mut collections = self.collections.write().map_err(|_| Self::lock_poisoned())?;
    let table = collections.entry(collection.to_owned()).or_default();

    match table.get(&id) {
      Some(existing) if Some(existing.rev.clone()) != given_rev => {
        return Err(EngineError::Conflict { id });
      }
      _ => {}
    }

    let rev = Self::fresh_rev();
    let stamped = Self::stamp(doc, &id, &rev);
    let record = Record {
      id: id.clone(),
      rev,
      doc: stamped,
    };
    table.insert(id, record.clone());
    Ok(record)
  }

  async fn post(&self, collection: &str, doc: Value) -> Result<Record> {
    let id = Uuid::new_v4().to_string();
    let rev = Self::fresh_rev();
    let stamped = Self::stamp(doc, &id, &rev);
    let record = Record {
      id: id.clone(),
      rev,
      doc: stamped,
    };
    let mut collections = self.collections.write().map_err(|_| Self::lock_poisoned())?;
    collections.entry(collection.to_owned()).or_default().insert(id, record.clone());
    Ok(record)
  }

  async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>> {
    let collections = self.collections.read().map_err(|_| Self::lock_poisoned())?;
    Ok(collections.get(collection).and_then(|table| table.get(id)).cloned())
  }

  async fn find(&self, collection: &str, query: FindQuery) -> Result<Vec<Record>> {
    let collections = self.collections.read().map_err(|_| Self::lock_poisoned())?;
    let Some(table) = collections.get(collection) else {
      return Ok(Vec::new());
    };

    let mut matches: Vec<Record> = table
      .values()
      .filter(|record| query.selector.matches(&record.doc))
      .cloned()
      .collect();
    matches.sort_by(|a, b| a.id.cmp(&b.id));

    if let Some(limit) = query.limit {
      matches.truncate(limit);
    }
    Ok(matches)
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<()> {
    let mut collections = self.collections.write().map_err(|_| Self::lock_poisoned())?;
    if let Some(table) = collections.get_mut(collection) {
      table.remove(id);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::engine::Engine;
  use crate::engine::Selector;

  #[tokio::test]
  async fn put_without_rev_inserts_new_record() {
    let engine = InMemoryEngine::new();
    let record = engine
      .put("coll", json!({"_id": "a", "value": 1}))
      .await
      .unwrap();
    assert_eq!(record.id, "a");
  }

  #[tokio::test]
  async fn put_with_stale_rev_conflicts() {
    let engine = InMemoryEngine::new();
    let first = engine.put("coll", json!({"_id": "a", "value": 1})).await.unwrap();
    let second = engine
      .put("coll", json!({"_id": "a", "_rev": first.rev, "value": 2}))
      .await
      .unwrap();
    let err = engine
      .put("coll", json!({"_id": "a", "_rev": first.rev, "value": 3}))
      .await
      .unwrap_err();
    assert!(matches!(err, EngineError::Conflict { .. }));
    assert_eq!(second.doc["value"], 2);
  }

  #[tokio::test]
  async fn find_applies_selector_and_limit() {
    let engine = InMemoryEngine::new();
    for (id, value) in [("a", "bar"), ("b", "bar"), ("c", "different")] {
      engine
        .put("coll", json!({"_id": id, "content": value}))
        .await
        .unwrap();
    }
    let query = FindQuery::new(Selector::eq("content", "bar")).limit(1);
    let results = engine.find("coll", query).await.unwrap();
    assert_eq!(results.len(), 1);
  }

  #[tokio::test]
  async fn get_returns_none_for_missing_id() {
    let engine = InMemoryEngine::new();
    assert!(engine.get("coll", "missing").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn delete_removes_record_and_is_idempotent() {
    let engine = InMemoryEngine::new();
    engine.put("coll", json!({"_id": "a", "value": 1})).await.unwrap();
    engine.delete("coll", "a").await.unwrap();
    assert!(engine.get("coll", "a").await.unwrap().is_none());
    engine.delete("coll", "a").await.unwrap();
  }
}
