// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

/// Errors surfaced by an [`Engine`](super::Engine) implementation.
#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
pub enum EngineError {
  /// A `put` was attempted against a stale `_rev` (the underlying engine's
  /// `409` response).
  #[error("conflict writing document \"{id}\"")]
  Conflict { id: String },

  /// The backing store reported a failure unrelated to optimistic
  /// concurrency (I/O, encoding, ...).
  #[error("storage engine error: {0}")]
  Backend(String),
}
