// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The blinded-attribute query compiler (spec §4.6): turns a structured
//! `equals`/`has` query into a [`Selector`] plus an index hint.

use hashbrown::HashMap;
use serde::Deserialize;
use serde::Serialize;

use super::encode_uri_component;
use super::ATTRIBUTES_INDEX;
use super::ATTRIBUTE_NAME_INDEX;
use crate::engine::FindQuery;
use crate::engine::Selector;
use crate::error::Error;
use crate::error::Result;

/// A structured attribute query, reified as an explicit typed parameter
/// record rather than a freeform option bag (spec §9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdvQuery {
  pub index: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub equals: Option<Vec<HashMap<String, String>>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub has: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub count: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub limit: Option<usize>,
}

fn validate(query: &EdvQuery) -> Result<()> {
  if query.index.is_empty() {
    return Err(Error::TypeError("\"edvQuery.index\" is required.".to_owned()));
  }
  match (&query.equals, &query.has) {
    (Some(_), Some(_)) | (None, None) => {
      return Err(Error::TypeError(
        "exactly one of \"edvQuery.equals\" or \"edvQuery.has\" must be set.".to_owned(),
      ))
    }
    _ => {}
  }
  if let Some(limit) = query.limit {
    if !(1..=1000).contains(&limit) {
      return Err(Error::TypeError("\"edvQuery.limit\" must be between 1 and 1000.".to_owned()));
    }
  }
  Ok(())
}

/// Compiles `query` into a [`FindQuery`] (selector plus index hint, no
/// `localEdvId`/vault scoping — that is added by
/// [`find`](super::find)). `query.count`, if set, is informational only:
/// callers decide whether to fetch all matches or stop at a count.
pub fn compile_query(query: &EdvQuery) -> Result<FindQuery> {
  validate(query)?;

  let h = encode_uri_component(&query.index);

  let (selector, index) = match (&query.equals, &query.has) {
    (Some(equals), None) => {
      let branches = equals
        .iter()
        .map(|entry| {
          let values: Vec<serde_json::Value> = entry
            .iter()
            .map(|(name, value)| format!("{h}:{}:{}", encode_uri_component(name), encode_uri_component(value)).into())
            .collect();
          Selector::ArrayContainsAll {
            field: "attributes".to_owned(),
            values,
          }
        })
        .collect();
      (
        Selector::And(vec![Selector::Exists("attributes".to_owned()), Selector::Or(branches)]),
        ATTRIBUTES_INDEX,
      )
    }
    (None, Some(has)) => {
      let values: Vec<serde_json::Value> = has.iter().map(|name| format!("{h}:{}", encode_uri_component(name)).into()).collect();
      (
        Selector::ArrayContainsAll {
          field: "attributeNames".to_owned(),
          values,
        },
        ATTRIBUTE_NAME_INDEX,
      )
    }
    _ => unreachable!("validate() guarantees exactly one of equals/has is set"),
  };

  let mut compiled = FindQuery::new(selector).use_index("edv-doc", index);
  if let Some(limit) = query.limit {
    compiled = compiled.limit(limit);
  }
  Ok(compiled)
}
