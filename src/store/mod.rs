// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Store primitives layered over an [`Engine`](crate::engine::Engine):
//! `insert_one`/`update_one`, implementing the non-atomic uniqueness
//! check-then-write loop described in spec §4.1.

mod error;

pub use self::error::ConstraintError;

use serde_json::Value;

use crate::engine::Engine;
use crate::engine::EngineError;
use crate::engine::FindQuery;
use crate::engine::Record;
use crate::engine::Selector;
use crate::error::Error;
use crate::error::Result;

/// A uniqueness constraint: a selector expected to match at most the record
/// being written.
#[derive(Debug, Clone)]
pub struct UniqueConstraint {
  pub selector: Selector,
}

impl UniqueConstraint {
  pub fn new(selector: Selector) -> Self {
    Self { selector }
  }
}

fn implicit_id_constraint(doc: &Value) -> Option<UniqueConstraint> {
  let id = doc.get("_id")?.as_str()?.to_owned();
  Some(UniqueConstraint::new(Selector::eq("_id", id)))
}

/// Checks every constraint in turn; fails on the first hit whose `_id` is
/// not `allowed_id` (the record being written is allowed to match its own
/// constraints, e.g. during an update).
async fn check_constraints(
  engine: &dyn Engine,
  collection: &str,
  constraints: &[UniqueConstraint],
  allowed_id: Option<&str>,
) -> Result<()> {
  for constraint in constraints {
    let query = FindQuery::new(constraint.selector.clone()).limit(1);
    let hits = engine
      .find(collection, query)
      .await
      .map_err(map_engine_error)?;
    if let Some(hit) = hits.into_iter().next() {
      if Some(hit.id.as_str()) != allowed_id {
        return Err(Error::Constraint(ConstraintError::Violated { existing: hit.doc }));
      }
    }
  }
  Ok(())
}

fn map_engine_error(err: EngineError) -> Error {
  match err {
    EngineError::Conflict { id } => Error::Engine(EngineError::Conflict { id }),
    other => Error::Engine(other),
  }
}

/// The outcome of a successful [`insert_one`]/[`update_one`] call: the
/// engine's record envelope plus the final document that was written.
#[derive(Debug, Clone)]
pub struct WriteResult {
  pub record: Record,
}

/// Inserts `doc`, retrying on `_rev` conflicts, after checking that no
/// `unique_constraints` (plus the implicit `_id` constraint, if `doc` carries
/// one) already match another record.
pub async fn insert_one(
  engine: &dyn Engine,
  collection: &str,
  doc: Value,
  mut unique_constraints: Vec<UniqueConstraint>,
) -> Result<WriteResult> {
  if let Some(implicit) = implicit_id_constraint(&doc) {
    unique_constraints.insert(0, implicit);
  }

  loop {
    check_constraints(engine, collection, &unique_constraints, None).await?;

    let put_result = if doc.get("_id").is_some() {
      engine.put(collection, doc.clone()).await
    } else {
      engine.post(collection, doc.clone()).await
    };

    match put_result {
      Ok(record) => return Ok(WriteResult { record }),
      Err(EngineError::Conflict { .. }) => continue,
      Err(other) => return Err(Error::Engine(other)),
    }
  }
}

/// Looks up the record matched by `selector`; if found, rewrites it (subject
/// to the same uniqueness check as [`insert_one`], excluding the matched
/// record itself); if not found, either delegates to [`insert_one`] (when
/// `upsert` is set) or returns `Ok(None)`.
pub async fn update_one(
  engine: &dyn Engine,
  collection: &str,
  selector: Selector,
  doc: Value,
  upsert: bool,
  mut unique_constraints: Vec<UniqueConstraint>,
) -> Result<Option<WriteResult>> {
  loop {
    let existing = engine
      .find(collection, FindQuery::new(selector.clone()).limit(1))
      .await
      .map_err(map_engine_error)?
      .into_iter()
      .next();

    let Some(existing) = existing else {
      return if upsert {
        insert_one(engine, collection, doc, unique_constraints).await.map(Some)
      } else {
        Ok(None)
      };
    };

    if let Some(implicit) = implicit_id_constraint(&doc) {
      if !unique_constraints
        .iter()
        .any(|constraint| constraint.selector == implicit.selector)
      {
        unique_constraints.insert(0, implicit);
      }
    }

    check_constraints(engine, collection, &unique_constraints, Some(existing.id.as_str())).await?;

    let mut next_doc = doc.clone();
    if let Value::Object(map) = &mut next_doc {
      map.insert("_id".to_owned(), Value::String(existing.id.clone()));
      map.insert("_rev".to_owned(), Value::String(existing.rev.clone()));
    }

    match engine.put(collection, next_doc).await {
      Ok(record) => return Ok(Some(WriteResult { record })),
      Err(EngineError::Conflict { .. }) => continue,
      Err(other) => return Err(Error::Engine(other)),
    }
  }
}
