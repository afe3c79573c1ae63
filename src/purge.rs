// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Tombstone sweep (spec §4.8): walks a collection for records flagged
//! `_deleted` and removes them permanently. Invoked after deletes; at most
//! one sweep per collection is in flight, with concurrent triggers
//! coalescing into that sweep rather than starting a second one.

use std::sync::Arc;

use hashbrown::HashMap;
use tokio::sync::Notify;

use crate::engine::Engine;
use crate::engine::FindQuery;
use crate::engine::Selector;
use crate::utils::Shared;

fn deleted_query() -> FindQuery {
  FindQuery::new(Selector::eq("_deleted", true))
}

/// Sweeps `collection` once, deleting every record flagged `_deleted`.
/// Returns the number of records removed. Errors from the underlying engine
/// are logged and swallowed, per spec §7's purge propagation policy;
/// callers never see a purge failure.
pub async fn sweep(engine: &dyn Engine, collection: &str) -> usize {
  let hits = match engine.find(collection, deleted_query()).await {
    Ok(hits) => hits,
    Err(err) => {
      log::warn!("purge: failed to scan collection \"{collection}\": {err}");
      return 0;
    }
  };

  let mut removed = 0;
  for record in hits {
    match engine.delete(collection, &record.id).await {
      Ok(()) => removed += 1,
      Err(err) => log::warn!("purge: failed to delete \"{}\" from \"{collection}\": {err}", record.id),
    }
  }
  removed
}

/// Coalesces concurrent purge requests per collection: a caller racing an
/// in-flight sweep waits on that sweep instead of starting its own.
#[derive(Default)]
pub struct PurgeScheduler {
  in_flight: Shared<HashMap<String, Arc<Notify>>>,
}

impl PurgeScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Triggers a purge of `collection`, or waits for the currently in-flight
  /// one to finish. Idempotent: a sweep that finds nothing to remove is a
  /// no-op.
  pub async fn trigger(&self, engine: &dyn Engine, collection: &str) {
    let notify = Arc::new(Notify::new());
    let joined = {
      let mut guard = match self.in_flight.write() {
        Ok(guard) => guard,
        Err(err) => {
          log::warn!("purge: scheduler lock poisoned, skipping sweep of \"{collection}\": {err}");
          return;
        }
      };
      match guard.entry(collection.to_owned()) {
        hashbrown::hash_map::Entry::Occupied(entry) => Some(entry.get().clone()),
        hashbrown::hash_map::Entry::Vacant(entry) => {
          entry.insert(notify.clone());
          None
        }
      }
    };

    if let Some(existing) = joined {
      existing.notified().await;
      return;
    }

    log::debug!("purge: sweeping collection \"{collection}\"");
    sweep(engine, collection).await;

    match self.in_flight.write() {
      Ok(mut guard) => {
        guard.remove(collection);
      }
      Err(err) => log::warn!("purge: scheduler lock poisoned while clearing \"{collection}\": {err}"),
    }
    notify.notify_waiters();
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::engine::InMemoryEngine;

  #[tokio::test]
  async fn sweep_removes_only_deleted_records() {
    let engine = InMemoryEngine::new();
    engine.put("coll", json!({"_id": "a", "value": 1})).await.unwrap();
    engine.put("coll", json!({"_id": "b", "value": 2, "_deleted": true})).await.unwrap();

    let removed = sweep(&engine, "coll").await;
    assert_eq!(removed, 1);
    assert!(engine.get("coll", "a").await.unwrap().is_some());
    assert!(engine.get("coll", "b").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn sweep_is_idempotent() {
    let engine = InMemoryEngine::new();
    engine.put("coll", json!({"_id": "a", "_deleted": true})).await.unwrap();
    assert_eq!(sweep(&engine, "coll").await, 1);
    assert_eq!(sweep(&engine, "coll").await, 0);
  }

  #[tokio::test]
  async fn scheduler_trigger_purges_tombstoned_record() {
    let engine = InMemoryEngine::new();
    engine.put("coll", json!({"_id": "a", "_deleted": true})).await.unwrap();

    let scheduler = PurgeScheduler::new();
    scheduler.trigger(&engine, "coll").await;
    assert!(engine.get("coll", "a").await.unwrap().is_none());
  }
}
