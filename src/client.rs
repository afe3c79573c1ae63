// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Orchestrates vault creation, unlocking, and document/chunk CRUD (spec
//! §4.9) by composing the secret, config, and document layers behind a
//! [`Transport`].

use std::sync::Arc;

use crate::chunks::Chunk;
use crate::chunks::ChunkRecord;
use crate::config::ConfigRepository;
use crate::documents::EdvQuery;
use crate::documents::EncryptedDocument;
use crate::edv_config;
use crate::edv_config::VaultConfig;
use crate::engine::Engine;
use crate::error::Error;
use crate::error::Result;
use crate::secrets;
use crate::secrets::SecretConfig;
use crate::secrets::UnlockedKeys;
use crate::transport::FindResult;
use crate::transport::LocalTransport;
use crate::transport::Transport;
use crate::types::CipherVersion;
use crate::types::KeyReference;

const SECRET_COLLECTION: &str = "edv-storage-secret";

/// Options for [`create_edv`], replacing the freeform option bag the
/// original takes with an explicit typed parameter record (spec §9).
pub struct CreateEdvOpts {
  pub config: VaultConfig,
  pub password: Option<String>,
  pub cipher_version: CipherVersion,
}

impl CreateEdvOpts {
  pub fn new(config: VaultConfig) -> Self {
    Self {
      config,
      password: None,
      cipher_version: CipherVersion::default(),
    }
  }

  pub fn password(mut self, password: impl Into<String>) -> Self {
    self.password = Some(password.into());
    self
  }

  pub fn cipher_version(mut self, cipher_version: CipherVersion) -> Self {
    self.cipher_version = cipher_version;
    self
  }
}

fn kak_type(cipher_version: CipherVersion) -> &'static str {
  match cipher_version {
    CipherVersion::Recommended => "X25519KeyAgreementKey2020",
    CipherVersion::Fips => "Multikey",
  }
}

/// Generates (or reuses) a secret for `id`, per spec §4.9's `lazyCreateSecret`.
async fn lazy_create_secret(
  engine: &dyn Engine,
  id: &str,
  password: &str,
  cipher_version: CipherVersion,
) -> Result<(UnlockedKeys, SecretConfig)> {
  let (keys, secret_config) = secrets::generate(id, password, cipher_version)?;
  let repo = ConfigRepository::<SecretConfig>::new(engine, SECRET_COLLECTION);

  match repo.insert(secret_config.clone()).await {
    Ok(_) => Ok((keys, secret_config)),
    Err(Error::Constraint(_)) => {
      let vault_repo = ConfigRepository::<VaultConfig>::new(engine, edv_config::COLLECTION);
      match vault_repo.get(id).await {
        Ok(_) => Err(Error::Duplicate("Duplicate EDV configuration.".to_owned())),
        Err(Error::NotFound(_)) => {
          let existing = repo.get(id).await?;
          match secrets::decrypt(&existing, password)? {
            Some(keys) => Ok((keys, existing)),
            None => Err(Error::Other(format!(
              "Secret already exists for EDV ID ({id}) but password to unlock it is invalid."
            ))),
          }
        }
        Err(other) => Err(other),
      }
    }
    Err(other) => Err(other),
  }
}

/// Creates a new vault, optionally generating and wrapping a fresh secret
/// for it. Returns the (possibly key-enriched) persisted config, plus an
/// unlocked [`PouchEdvClient`] iff a password was supplied.
pub async fn create_edv(engine: Arc<dyn Engine>, opts: CreateEdvOpts) -> Result<(VaultConfig, Option<PouchEdvClient>)> {
  let CreateEdvOpts {
    mut config,
    password,
    cipher_version,
  } = opts;

  let client = match password {
    Some(password) => {
      if config.hmac.is_some() || config.key_agreement_key.is_some() {
        return Err(Error::TypeError(
          "\"config\" must not have \"hmac\" or \"keyAgreementKey\" if these are to be populated using locally generated secrets."
            .to_owned(),
        ));
      }

      let (keys, secret_config) = lazy_create_secret(&*engine, &config.id, &password, cipher_version).await?;
      config.hmac = Some(KeyReference::new(secret_config.hmac_id.clone(), "Sha256HmacKey2019"));
      config.key_agreement_key = Some(KeyReference::new(
        secret_config.key_agreement_key_id.clone(),
        kak_type(keys.cipher_version),
      ));

      Some(PouchEdvClient::new(config.id.clone(), engine.clone(), Some(keys)))
    }
    None => None,
  };

  let repo = ConfigRepository::<VaultConfig>::new(&*engine, edv_config::COLLECTION);
  let config = match repo.insert(config).await {
    Ok(config) => config,
    Err(Error::Constraint(err)) => return Err(Error::duplicate_from_constraint(err)),
    Err(other) => return Err(other),
  };

  Ok((config, client))
}

/// Unlocks an existing vault by id and password.
pub async fn from_local_secrets(engine: Arc<dyn Engine>, edv_id: &str, password: &str) -> Result<PouchEdvClient> {
  let secret_repo = ConfigRepository::<SecretConfig>::new(&*engine, SECRET_COLLECTION);
  let secret_config = secret_repo.get(edv_id).await?;
  let keys = secrets::decrypt(&secret_config, password)?.ok_or_else(|| Error::Other("Invalid password.".to_owned()))?;

  ConfigRepository::<VaultConfig>::new(&*engine, edv_config::COLLECTION).get(edv_id).await?;

  Ok(PouchEdvClient::new(edv_id, engine, Some(keys)))
}

/// An unlocked handle onto one vault's documents and chunks, delegating
/// every CRUD operation to a [`Transport`] (spec §4.9).
pub struct PouchEdvClient {
  edv_id: String,
  transport: Arc<dyn Transport>,
  keys: Option<UnlockedKeys>,
}

impl PouchEdvClient {
  fn new(edv_id: impl Into<String>, engine: Arc<dyn Engine>, keys: Option<UnlockedKeys>) -> Self {
    let edv_id = edv_id.into();
    Self {
      transport: Arc::new(LocalTransport::new(engine, edv_id.clone())),
      edv_id,
      keys,
    }
  }

  pub fn edv_id(&self) -> &str {
    &self.edv_id
  }

  pub fn keys(&self) -> Option<&UnlockedKeys> {
    self.keys.as_ref()
  }

  pub async fn insert(&self, doc: EncryptedDocument) -> Result<()> {
    self.transport.insert(doc).await
  }

  pub async fn update(&self, doc: EncryptedDocument) -> Result<()> {
    self.transport.update(doc, false).await
  }

  /// Tombstones `doc` (an upsert with `deleted=true`), per the
  /// `_deleteTransport` wrapping described in spec §4.9.
  pub async fn delete(&self, doc: EncryptedDocument) -> Result<()> {
    self.transport.update(doc, true).await
  }

  pub async fn get(&self, id: &str) -> Result<EncryptedDocument> {
    self.transport.get(id).await
  }

  /// Equivalent to [`Self::get`]: this crate has no separate streaming I/O
  /// path, content being an in-memory `jwe` blob either way.
  pub async fn get_stream(&self, id: &str) -> Result<EncryptedDocument> {
    self.transport.get(id).await
  }

  pub async fn count(&self, query: &EdvQuery) -> Result<usize> {
    let mut counting = query.clone();
    counting.count = Some(true);
    let result = self.transport.find(&counting).await?;
    Ok(result.count.unwrap_or(result.documents.len()))
  }

  /// Executes `query`, requesting one extra record over `query.limit` (if
  /// set) to compute `has_more` without a separate count query, per spec
  /// §4.9.
  pub async fn find(&self, query: &EdvQuery) -> Result<FindResult> {
    let requested_limit = query.limit;
    let mut probe = query.clone();
    if let Some(limit) = requested_limit {
      probe.limit = Some(limit + 1);
    }

    let mut result = self.transport.find(&probe).await?;
    if let Some(limit) = requested_limit {
      let has_more = result.documents.len() > limit;
      result.documents.truncate(limit);
      result.has_more = has_more;
    }
    Ok(result)
  }

  pub async fn get_config(&self) -> Result<VaultConfig> {
    self.transport.get_config(&self.edv_id).await
  }

  pub async fn update_config(&self, config: VaultConfig) -> Result<VaultConfig> {
    self.transport.update_config(config).await
  }

  pub async fn store_chunk(&self, doc_id: &str, chunk: Chunk) -> Result<ChunkRecord> {
    self.transport.store_chunk(doc_id, chunk).await
  }

  pub async fn get_chunk(&self, doc_id: &str, index: u64) -> Result<Chunk> {
    self.transport.get_chunk(doc_id, index).await
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::engine::InMemoryEngine;

  fn doc(id: &str, sequence: u64) -> EncryptedDocument {
    EncryptedDocument {
      id: id.to_owned(),
      sequence,
      jwe: json!({"ciphertext": "..."}),
      indexed: None,
      meta: None,
    }
  }

  fn engine() -> Arc<dyn Engine> {
    Arc::new(InMemoryEngine::new())
  }

  // S1
  #[tokio::test]
  async fn create_edv_rejects_conflicting_key_specification() {
    let mut config = VaultConfig::new("vault-1", "urn:controller");
    config.hmac = Some(KeyReference::new("urn:hmac", "urn:hmac-type"));
    config.key_agreement_key = Some(KeyReference::new("urn:keyAgreement", "urn:keyAgreement-type"));

    let err = create_edv(engine(), CreateEdvOpts::new(config).password("pw")).await.unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));
  }

  // S2
  #[tokio::test]
  async fn create_edv_without_password_returns_config_only() {
    let mut config = VaultConfig::new("vault-1", "urn:controller");
    config.hmac = Some(KeyReference::new("urn:hmac", "urn:hmac-type"));
    config.key_agreement_key = Some(KeyReference::new("urn:keyAgreement", "urn:keyAgreement-type"));

    let (returned, client) = create_edv(engine(), CreateEdvOpts::new(config.clone())).await.unwrap();
    assert!(client.is_none());
    assert_eq!(returned, config);
  }

  // S3
  #[tokio::test]
  async fn create_edv_reuses_pregenerated_secret() {
    let engine = engine();
    let (_, pregenerated) = secrets::generate("vault-1", "pw", CipherVersion::default()).unwrap();
    ConfigRepository::<SecretConfig>::new(&*engine, SECRET_COLLECTION)
      .insert(pregenerated)
      .await
      .unwrap();

    let config = VaultConfig::new("vault-1", "urn:controller");
    let (returned, client) = create_edv(engine, CreateEdvOpts::new(config).password("pw")).await.unwrap();
    assert!(client.is_some());
    assert!(returned.hmac.is_some());
    assert!(returned.key_agreement_key.is_some());
  }

  // S4
  #[tokio::test]
  async fn create_edv_with_pregenerated_secret_and_wrong_password_fails() {
    let engine = engine();
    let (_, pregenerated) = secrets::generate("vault-1", "pw", CipherVersion::default()).unwrap();
    ConfigRepository::<SecretConfig>::new(&*engine, SECRET_COLLECTION)
      .insert(pregenerated)
      .await
      .unwrap();

    let config = VaultConfig::new("vault-1", "urn:controller");
    let err = create_edv(engine, CreateEdvOpts::new(config).password("invalid")).await.unwrap_err();
    assert!(matches!(err, Error::Other(_)));
  }

  // S5
  #[tokio::test]
  async fn duplicate_create_edv_fails() {
    let engine = engine();
    let config = VaultConfig::new("vault-1", "urn:controller");
    create_edv(engine.clone(), CreateEdvOpts::new(config).password("pw")).await.unwrap();

    let config = VaultConfig::new("vault-1", "urn:controller");
    let err = create_edv(engine, CreateEdvOpts::new(config).password("pw")).await.unwrap_err();
    assert!(matches!(err, Error::Duplicate(_)));
  }

  #[tokio::test]
  async fn client_crud_round_trips() {
    let engine = engine();
    let config = VaultConfig::new("vault-1", "urn:controller");
    let (_, client) = create_edv(engine, CreateEdvOpts::new(config).password("pw")).await.unwrap();
    let client = client.unwrap();

    client.insert(doc("doc-1", 0)).await.unwrap();
    let fetched = client.get("doc-1").await.unwrap();
    assert_eq!(fetched.sequence, 0);

    client.update(doc("doc-1", 1)).await.unwrap();
    assert_eq!(client.get("doc-1").await.unwrap().sequence, 1);
  }

  // S8
  #[tokio::test]
  async fn find_reports_has_more_when_results_exceed_limit() {
    let engine = engine();
    let config = VaultConfig::new("vault-1", "urn:controller");
    let (_, client) = create_edv(engine, CreateEdvOpts::new(config).password("pw")).await.unwrap();
    let client = client.unwrap();
    let hmac_id = "urn:hmac:1";

    for (id, value) in [("doc-1", "bar"), ("doc-2", "bar"), ("doc-3", "different")] {
      let attr = crate::documents::Attribute::new("content.foo", value);
      client
        .insert(EncryptedDocument {
          id: id.to_owned(),
          sequence: 0,
          jwe: json!({}),
          indexed: Some(vec![crate::documents::IndexedEntry {
            hmac: KeyReference::new(hmac_id, "Sha256HmacKey2019"),
            sequence: 0,
            attributes: vec![attr],
          }]),
          meta: None,
        })
        .await
        .unwrap();
    }

    let mut equals = hashbrown::HashMap::new();
    equals.insert("content.foo".to_owned(), "bar".to_owned());
    let query = EdvQuery {
      index: hmac_id.to_owned(),
      equals: Some(vec![equals]),
      has: None,
      count: None,
      limit: Some(1),
    };

    let result = client.find(&query).await.unwrap();
    assert_eq!(result.documents.len(), 1);
    assert!(result.has_more);

    let query = EdvQuery { limit: Some(2), ..query };
    let result = client.find(&query).await.unwrap();
    assert_eq!(result.documents.len(), 2);
    assert!(!result.has_more);
  }
}
