// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Encrypted-document CRUD, attribute index maintenance, and find (spec
//! §4.6).

mod query;
mod types;

pub use self::query::compile_query;
pub use self::query::EdvQuery;
pub use self::types::Attribute;
pub use self::types::DocumentRecord;
pub use self::types::EncryptedDocument;
pub use self::types::IndexedEntry;

use crate::engine::Engine;
use crate::engine::FindQuery;
use crate::engine::Selector;
use crate::error::Error;
use crate::error::Result;
use crate::store;
use crate::store::UniqueConstraint;

/// Logical collection name for documents (spec §6).
pub const COLLECTION: &str = "edv-storage-doc";
/// Index name used for the `attributes.unique` partial index.
pub const UNIQUE_ATTRIBUTE_INDEX: &str = "attributes.unique";
/// Index name used for the `attributes` partial index (equals-form queries).
pub(crate) const ATTRIBUTES_INDEX: &str = "attributes";
/// Index name used for the `attributes.name` partial index (has-form
/// queries).
pub(crate) const ATTRIBUTE_NAME_INDEX: &str = "attributes.name";

fn record_id(edv_id: &str, doc_id: &str) -> String {
  format!("{edv_id}:{doc_id}")
}

/// Percent-encodes `input` the way JavaScript's `encodeURIComponent` does:
/// alphanumerics and `-_.!~*'()` pass through unescaped; everything else is
/// escaped as `%XX` over its UTF-8 bytes.
fn encode_uri_component(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for byte in input.bytes() {
    match byte {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => {
        out.push(byte as char);
      }
      _ => out.push_str(&format!("%{byte:02X}")),
    }
  }
  out
}

/// Computes the `name` and `full` blinded-attribute strings for `attr`
/// under the given HMAC key reference id, per the pseudocode in spec §4.6.
fn blinded_strings(hmac_id: &str, attr: &Attribute) -> (String, String) {
  let h = encode_uri_component(hmac_id);
  let name = format!("{h}:{}", encode_uri_component(&attr.name));
  let full = format!("{name}:{}", encode_uri_component(&attr.value));
  (name, full)
}

/// Rebuilds `attributes`/`attributeNames`/`uniqueAttributes` from
/// `doc.indexed`.
fn build_auxiliary_arrays(doc: &EncryptedDocument) -> (Vec<String>, Vec<String>, Vec<String>) {
  let mut attributes = Vec::new();
  let mut attribute_names = Vec::new();
  let mut unique_attributes = Vec::new();

  for entry in doc.indexed.iter().flatten() {
    for attr in &entry.attributes {
      let (name, full) = blinded_strings(&entry.hmac.id, attr);
      attributes.push(full.clone());
      attribute_names.push(name);
      if attr.unique == Some(true) {
        unique_attributes.push(full);
      }
    }
  }

  (attributes, attribute_names, unique_attributes)
}

fn build_record(edv_id: &str, doc: EncryptedDocument, deleted: bool) -> Result<DocumentRecord> {
  let (attributes, attribute_names, unique_attributes) = build_auxiliary_arrays(&doc);

  Ok(DocumentRecord {
    id: record_id(edv_id, &doc.id),
    local_edv_id: edv_id.to_owned(),
    doc,
    attributes: (!attributes.is_empty()).then_some(attributes),
    attribute_names: (!attribute_names.is_empty()).then_some(attribute_names),
    unique_attributes: (!unique_attributes.is_empty()).then_some(unique_attributes),
    deleted: deleted.then_some(true),
  })
}

fn unique_attribute_constraint(edv_id: &str, unique_attributes: &[String]) -> Option<UniqueConstraint> {
  if unique_attributes.is_empty() {
    return None;
  }
  Some(UniqueConstraint::new(Selector::And(vec![
    Selector::eq("localEdvId", edv_id),
    Selector::ArrayIntersects {
      field: "uniqueAttributes".to_owned(),
      values: unique_attributes.iter().map(|value| value.clone().into()).collect(),
    },
  ])))
}

fn to_json(record: &DocumentRecord) -> Result<serde_json::Value> {
  serde_json::to_value(record).map_err(|err| Error::Other(format!("failed to encode document: {err}")))
}

fn from_json(value: serde_json::Value) -> Result<DocumentRecord> {
  serde_json::from_value(value).map_err(|err| Error::Other(format!("failed to decode document: {err}")))
}

/// Inserts a new document. Fails with [`Error::Constraint`] if `doc.id` or
/// any `unique` attribute collides with an existing record.
pub async fn insert(engine: &dyn Engine, edv_id: &str, doc: EncryptedDocument) -> Result<DocumentRecord> {
  let record = build_record(edv_id, doc, false)?;
  let mut constraints = Vec::new();
  if let Some(constraint) = unique_attribute_constraint(edv_id, record.unique_attributes.as_deref().unwrap_or_default()) {
    constraints.push(constraint);
  }

  let json = to_json(&record)?;
  store::insert_one(engine, COLLECTION, json, constraints).await?;
  Ok(record)
}

/// Upserts a document (or tombstones it, when `deleted` is set), gated on
/// `doc.sequence - 1` matching the currently stored sequence.
pub async fn upsert(engine: &dyn Engine, edv_id: &str, doc: EncryptedDocument, deleted: bool) -> Result<DocumentRecord> {
  let record = build_record(edv_id, doc, deleted)?;
  let mut constraints = Vec::new();
  if let Some(constraint) = unique_attribute_constraint(edv_id, record.unique_attributes.as_deref().unwrap_or_default()) {
    constraints.push(constraint);
  }

  // `doc.sequence == 0` means "insert a brand-new document"; no stored
  // sequence can ever equal -1, so the selector below correctly falls
  // through to `insert_one` via `upsert=true` in that case.
  let previous_sequence: serde_json::Value = match record.doc.sequence.checked_sub(1) {
    Some(previous) => previous.into(),
    None => (-1i64).into(),
  };
  let selector = Selector::Eq(vec![
    ("_id".to_owned(), record.id.clone().into()),
    ("doc.sequence".to_owned(), previous_sequence),
  ]);

  let json = to_json(&record)?;
  match store::update_one(engine, COLLECTION, selector, json, true, constraints).await {
    Ok(_) => Ok(record),
    Err(Error::Constraint(err)) if err.existing_id() == Some(record.id.as_str()) => Err(Error::InvalidState(
      "Could not update document. Sequence does not match.".to_owned(),
    )),
    Err(other) => Err(other),
  }
}

/// Fetches a document by id.
pub async fn get(engine: &dyn Engine, edv_id: &str, id: &str) -> Result<DocumentRecord> {
  let full_id = record_id(edv_id, id);
  let hits = engine
    .find(COLLECTION, FindQuery::new(Selector::eq("_id", full_id)).limit(1))
    .await
    .map_err(Error::Engine)?;
  let record = hits
    .into_iter()
    .next()
    .ok_or_else(|| Error::NotFound("Document not found.".to_owned()))?;
  from_json(record.doc)
}

/// Executes a query compiled by [`compile_query`] (or an equivalent
/// selector), forcing `localEdvId` into the selector so a query can never
/// cross vault boundaries.
pub async fn find(engine: &dyn Engine, edv_id: &str, query: FindQuery) -> Result<Vec<DocumentRecord>> {
  let scoped = FindQuery {
    selector: Selector::eq("localEdvId", edv_id).and(query.selector),
    limit: query.limit,
    use_index: query.use_index,
  };

  let hits = engine.find(COLLECTION, scoped).await.map_err(Error::Engine)?;
  hits.into_iter().map(|record| from_json(record.doc)).collect()
}
