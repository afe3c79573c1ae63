// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Password-gated secret lifecycle (spec §4.4): generating a fresh secret
//! config for a vault, and decrypting one back into its derived sub-keys.

mod config;

pub use self::config::KeyAgreement;
pub use self::config::SecretConfig;
pub use self::config::SecretMaterial;
pub use self::config::UnlockedKeys;
pub use self::config::SECRET_VERSION;

use uuid::Uuid;
use zeroize::Zeroize;

use crate::crypto::derive_bits;
use crate::crypto::Hmac;
use crate::crypto::Kek;
use crate::crypto::P256Kak;
use crate::crypto::Pbkdf2Options;
use crate::crypto::X25519Kak;
use crate::error::Error;
use crate::error::Result;
use crate::multibase::decode_identity_multihash;
use crate::multibase::encode_identity_multihash;
use crate::types::CipherVersion;

const WRAPPED_KEY_SIZE: usize = 40;
const WRAPPED_KAK_RAW_SIZE: usize = 72;
const WRAPPED_KAK_SIZE: usize = 80;

fn fresh_urn() -> String {
  Uuid::new_v4().urn().to_string()
}

fn corrupted(field: &'static str) -> Error {
  Error::Other(format!("secret config field \"{field}\" is corrupted"))
}

/// Generates a fresh secret config for `id`, gated by `password`, using the
/// given cipher suite. Returns the unlocked keys alongside the persistable
/// config (sequence `0`); callers insert the config themselves via
/// [`crate::config::ConfigRepository`].
pub fn generate(id: &str, password: &str, cipher_version: CipherVersion) -> Result<(UnlockedKeys, SecretConfig)> {
  let kdk = Hmac::generate();

  let derived = derive_bits(Pbkdf2Options::new(password))?;
  let mut kek_secret: [u8; 32] = derived
    .derived_bits
    .as_slice()
    .try_into()
    .map_err(|_| Error::Other("PBKDF2 did not return 32 bytes".to_owned()))?;
  let kek = Kek::import(kek_secret);
  kek_secret.zeroize();

  let wrapped_key = kek.wrap_key(kdk.raw_bytes())?;

  let (key_agreement, wrapped_kak, cipher_version) = match cipher_version {
    CipherVersion::Fips => {
      let p256 = P256Kak::generate();
      let mut raw = p256.to_raw_padded();
      let wrapped = kek.wrap_key(&raw)?;
      raw.zeroize();
      (KeyAgreement::P256(p256), Some(wrapped), CipherVersion::Fips)
    }
    CipherVersion::Recommended => {
      let mut kak_secret = kdk.sign(b"keyAgreementKey")?;
      let x25519 = X25519Kak::import(kak_secret);
      kak_secret.zeroize();
      (KeyAgreement::X25519(x25519), None, CipherVersion::Recommended)
    }
  };

  let hmac = {
    let mut hmac_secret = kdk.sign(b"hmac")?;
    let hmac = Hmac::import(hmac_secret);
    hmac_secret.zeroize();
    hmac
  };

  let config = SecretConfig {
    id: id.to_owned(),
    hmac_id: fresh_urn(),
    key_agreement_key_id: fresh_urn(),
    secret: SecretMaterial {
      version: SECRET_VERSION.to_owned(),
      salt: encode_identity_multihash(&derived.salt),
      wrapped_key: encode_identity_multihash(&wrapped_key),
      wrapped_key_agreement_key: wrapped_kak.map(|bytes| encode_identity_multihash(&bytes)),
    },
    sequence: 0,
  };

  Ok((
    UnlockedKeys {
      hmac,
      key_agreement,
      cipher_version,
    },
    config,
  ))
}

/// Attempts to decrypt `config` with `password`. Returns `Ok(None)` (never
/// an error) when the password does not unlock the stored key — unwrap
/// failure must not be observable as anything but a `None`, per spec §4.3/§7.
pub fn decrypt(config: &SecretConfig, password: &str) -> Result<Option<UnlockedKeys>> {
  let salt: [u8; 16] = decode_identity_multihash(&config.secret.salt, 16)
    .ok_or_else(|| corrupted("salt"))?
    .try_into()
    .map_err(|_| corrupted("salt"))?;

  let wrapped_key =
    decode_identity_multihash(&config.secret.wrapped_key, WRAPPED_KEY_SIZE).ok_or_else(|| corrupted("wrappedKey"))?;

  let derived = derive_bits(Pbkdf2Options {
    salt: Some(salt),
    ..Pbkdf2Options::new(password)
  })?;
  let mut kek_secret: [u8; 32] = derived
    .derived_bits
    .as_slice()
    .try_into()
    .map_err(|_| Error::Other("PBKDF2 did not return 32 bytes".to_owned()))?;
  let kek = Kek::import(kek_secret);
  kek_secret.zeroize();

  let Some(mut kdk_secret) = kek.unwrap_key(&wrapped_key) else {
    return Ok(None);
  };
  let kdk_secret_array: [u8; 32] = match kdk_secret.as_slice().try_into() {
    Ok(array) => array,
    Err(_) => {
      kdk_secret.zeroize();
      return Err(corrupted("wrappedKey"));
    }
  };
  kdk_secret.zeroize();
  let kdk = Hmac::import(kdk_secret_array);

  let (key_agreement, cipher_version) = match &config.secret.wrapped_key_agreement_key {
    Some(wrapped_kak_encoded) => {
      let wrapped_kak =
        decode_identity_multihash(wrapped_kak_encoded, WRAPPED_KAK_SIZE).ok_or_else(|| corrupted("wrappedKeyAgreementKey"))?;
      let Some(mut raw) = kek.unwrap_key(&wrapped_kak) else {
        return Err(Error::Other("Invalid stored key agreement key.".to_owned()));
      };
      if raw.len() != WRAPPED_KAK_RAW_SIZE {
        raw.zeroize();
        return Err(corrupted("wrappedKeyAgreementKey"));
      }
      let secret_key: [u8; 32] = raw[..32].try_into().unwrap();
      let public_key: [u8; 33] = raw[32..65].try_into().unwrap();
      raw.zeroize();
      let p256 = P256Kak::import(&secret_key, &public_key)?;
      (KeyAgreement::P256(p256), CipherVersion::Fips)
    }
    None => {
      let mut kak_secret = kdk.sign(b"keyAgreementKey")?;
      let x25519 = X25519Kak::import(kak_secret);
      kak_secret.zeroize();
      (KeyAgreement::X25519(x25519), CipherVersion::Recommended)
    }
  };

  let mut hmac_secret = kdk.sign(b"hmac")?;
  let hmac = Hmac::import(hmac_secret);
  hmac_secret.zeroize();

  Ok(Some(UnlockedKeys {
    hmac,
    key_agreement,
    cipher_version,
  }))
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  #[test]
  fn generate_then_decrypt_recovers_matching_cipher_version_recommended() {
    let (_, config) = generate("vault-1", "correct horse", CipherVersion::Recommended).unwrap();
    let unlocked = decrypt(&config, "correct horse").unwrap().unwrap();
    assert_eq!(unlocked.cipher_version, CipherVersion::Recommended);
    assert!(matches!(unlocked.key_agreement, KeyAgreement::X25519(_)));
    assert!(config.secret.wrapped_key_agreement_key.is_none());
  }

  #[test]
  fn generate_then_decrypt_recovers_matching_cipher_version_fips() {
    let (_, config) = generate("vault-1", "correct horse", CipherVersion::Fips).unwrap();
    let unlocked = decrypt(&config, "correct horse").unwrap().unwrap();
    assert_eq!(unlocked.cipher_version, CipherVersion::Fips);
    assert!(matches!(unlocked.key_agreement, KeyAgreement::P256(_)));
    assert!(config.secret.wrapped_key_agreement_key.is_some());
  }

  #[test]
  fn decrypt_with_wrong_password_returns_none_not_error() {
    let (_, config) = generate("vault-1", "correct horse", CipherVersion::Recommended).unwrap();
    let result = decrypt(&config, "wrong password").unwrap();
    assert!(result.is_none());
  }

  proptest! {
    // PBKDF2 runs 100,000 iterations per call; keep the case count low.
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn decrypt_roundtrips_for_any_password(password in "[ -~]{1,32}") {
      let (_, config) = generate("vault-1", &password, CipherVersion::Recommended).unwrap();
      let unlocked = decrypt(&config, &password).unwrap();
      prop_assert!(unlocked.is_some());
    }

    #[test]
    fn decrypt_never_errors_on_a_wrong_password(password in "[ -~]{1,32}", guess in "[ -~]{1,32}") {
      prop_assume!(password != guess);
      let (_, config) = generate("vault-1", &password, CipherVersion::Recommended).unwrap();
      let result = decrypt(&config, &guess);
      prop_assert!(result.is_ok());
      prop_assert!(result.unwrap().is_none());
    }
  }
}
