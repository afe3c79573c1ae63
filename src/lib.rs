// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Core storage engine for client-side Encrypted Data Vaults (EDVs).
//!
//! This crate provides the password-gated secret vault, the document and
//! chunk store with its pseudo-unique constraints, and the blinded-attribute
//! query compiler. Content encryption/decryption itself is out of scope:
//! callers plug in their own encryption core through the
//! [`transport::Transport`] trait.

#![forbid(unsafe_code)]
#![allow(clippy::upper_case_acronyms)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  clippy::missing_safety_doc
)]

pub mod chunks;
pub mod client;
pub mod config;
pub mod crypto;
pub mod documents;
pub mod edv_config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod multibase;
pub mod purge;
pub mod secrets;
pub mod store;
pub mod transport;
pub mod types;
pub mod utils;

pub use self::client::CreateEdvOpts;
pub use self::client::PouchEdvClient;
pub use self::error::Error;
pub use self::error::Result;
pub use self::ids::VaultId;
