// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A small typed selector algebra covering exactly the query shapes this
//! crate issues against the underlying engine (spec §4.1/§4.6): field
//! equality, existence, `$in`, `$all`, and `$or`. Rearchitected as an
//! explicit enum rather than a freeform selector document, per spec §9's
//! guidance on dynamic configuration objects.

use serde_json::Value;

/// A query selector. Constructed by the store/document/chunk layers, never
/// by an external caller directly.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selector {
  /// Matches every document (used only as a placeholder default).
  #[default]
  All,
  /// All of the listed (field, value) pairs must match exactly.
  Eq(Vec<(String, Value)>),
  /// The named field must exist and not be JSON `null`.
  Exists(String),
  /// The named field (an array) must contain every value of `values`.
  ArrayContainsAll { field: String, values: Vec<Value> },
  /// The named field (an array) must contain at least one value of
  /// `values` (a Mango `$in` against an array field).
  ArrayIntersects { field: String, values: Vec<Value> },
  /// At least one child selector must match.
  Or(Vec<Selector>),
  /// Every child selector must match.
  And(Vec<Selector>),
}

impl Selector {
  pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::Eq(vec![(field.into(), value.into())])
  }

  pub fn and(mut self, other: Selector) -> Self {
    match &mut self {
      Selector::And(parts) => {
        parts.push(other);
        self
      }
      Selector::All => other,
      _ => Selector::And(vec![self, other]),
    }
  }

  /// Evaluates this selector against `doc`.
  pub fn matches(&self, doc: &Value) -> bool {
    match self {
      Selector::All => true,
      Selector::Eq(pairs) => pairs.iter().all(|(field, expected)| field_value(doc, field) == Some(expected)),
      Selector::Exists(field) => !matches!(field_value(doc, field), None | Some(Value::Null)),
      Selector::ArrayContainsAll { field, values } => {
        let Some(Value::Array(actual)) = field_value(doc, field) else {
          return false;
        };
        values.iter().all(|value| actual.contains(value))
      }
      Selector::ArrayIntersects { field, values } => {
        let Some(Value::Array(actual)) = field_value(doc, field) else {
          return false;
        };
        values.iter().any(|value| actual.contains(value))
      }
      Selector::Or(parts) => parts.iter().any(|part| part.matches(doc)),
      Selector::And(parts) => parts.iter().all(|part| part.matches(doc)),
    }
  }
}

/// Looks up a (possibly dotted) field path in `doc`.
fn field_value<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
  field.split('.').try_fold(doc, |current, part| current.get(part))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn eq_matches_exact_field() {
    let doc = json!({"_id": "a", "sequence": 1});
    assert!(Selector::eq("_id", "a").matches(&doc));
    assert!(!Selector::eq("_id", "b").matches(&doc));
  }

  #[test]
  fn exists_rejects_missing_and_null() {
    let doc = json!({"attributes": null});
    assert!(!Selector::Exists("attributes".into()).matches(&doc));
    assert!(!Selector::Exists("attributeNames".into()).matches(&doc));
  }

  #[test]
  fn array_contains_all_requires_every_value() {
    let doc = json!({"attributeNames": ["a:n1", "a:n2"]});
    let selector = Selector::ArrayContainsAll {
      field: "attributeNames".into(),
      values: vec![json!("a:n1"), json!("a:n2")],
    };
    assert!(selector.matches(&doc));
    let selector = Selector::ArrayContainsAll {
      field: "attributeNames".into(),
      values: vec![json!("a:n1"), json!("a:n3")],
    };
    assert!(!selector.matches(&doc));
  }

  #[test]
  fn or_matches_if_any_branch_matches() {
    let doc = json!({"attributes": ["x"]});
    let selector = Selector::Or(vec![
      Selector::ArrayContainsAll {
        field: "attributes".into(),
        values: vec![json!("x")],
      },
      Selector::ArrayContainsAll {
        field: "attributes".into(),
        values: vec![json!("y")],
      },
    ]);
    assert!(selector.matches(&doc));
  }

  #[test]
  fn array_intersects_requires_any_shared_value() {
    let doc = json!({"uniqueAttributes": ["a:n1:v1"]});
    let selector = Selector::ArrayIntersects {
      field: "uniqueAttributes".into(),
      values: vec![json!("a:n1:v1"), json!("a:n2:v2")],
    };
    assert!(selector.matches(&doc));
    let selector = Selector::ArrayIntersects {
      field: "uniqueAttributes".into(),
      values: vec![json!("a:n2:v2")],
    };
    assert!(!selector.matches(&doc));
  }

  #[test]
  fn dotted_field_paths_traverse_nested_objects() {
    let doc = json!({"secret": {"sequence": 3}});
    assert!(Selector::eq("secret.sequence", 3).matches(&doc));
  }
}
