// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Minimal base58/multibase/multihash-shaped codec.
//!
//! Full `multibase` and `multihash` crates support dozens of bases and
//! hash functions; this crate only ever produces and consumes one shape
//! (base58-btc, `z` prefix) over two kinds of payload:
//!
//! - key-material headers (a 2-byte multicodec varint prefix followed by
//!   fixed-size key bytes), used for exported X25519/P-256 key material.
//! - "identity multihash" envelopes (`0x00` code, one length byte, then the
//!   raw bytes), used for vault/document/secret identifiers and for the
//!   salt/wrapped-key fields of a secret config.
//!
//! so a focused `bs58`-based helper is used instead of pulling in the full
//! multiformats stack.

const MULTIBASE_BASE58_BTC: char = 'z';
/// Multihash code for the "identity" hash function (no hashing, raw bytes).
const IDENTITY_CODE: u8 = 0x00;

/// Encodes `data` prefixed with an arbitrary multicodec `header` as a
/// base58-btc multibase string (`z...`).
pub fn encode_multibase(header: &[u8], data: &[u8]) -> String {
  let mut buf = Vec::with_capacity(header.len() + data.len());
  buf.extend_from_slice(header);
  buf.extend_from_slice(data);
  format!("{MULTIBASE_BASE58_BTC}{}", bs58::encode(&buf).into_string())
}

/// Encodes `data` as a base58-btc identity-multihash string: `z` followed by
/// base58(`0x00` ++ `len(data)` ++ `data`). `data` must be at most 255 bytes
/// long (true for every payload this crate produces).
pub fn encode_identity_multihash(data: &[u8]) -> String {
  debug_assert!(data.len() <= u8::MAX as usize, "identity multihash payload too long");
  let mut buf = Vec::with_capacity(data.len() + 2);
  buf.push(IDENTITY_CODE);
  buf.push(data.len() as u8);
  buf.extend_from_slice(data);
  format!("{MULTIBASE_BASE58_BTC}{}", bs58::encode(&buf).into_string())
}

/// Decodes a base58-btc identity-multihash string produced by
/// [`encode_identity_multihash`], checking that the decoded payload is
/// exactly `expected_len` bytes long. Returns `None` for any malformed
/// input; callers are responsible for turning that into the error type and
/// message appropriate to their context.
pub fn decode_identity_multihash(encoded: &str, expected_len: usize) -> Option<Vec<u8>> {
  let rest = encoded.strip_prefix(MULTIBASE_BASE58_BTC)?;
  let bytes = bs58::decode(rest).into_vec().ok()?;

  if bytes.len() != expected_len + 2 || bytes[0] != IDENTITY_CODE || bytes[1] as usize != expected_len {
    return None;
  }

  Some(bytes[2..].to_vec())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identity_multihash_round_trips() {
    let data = [7u8; 16];
    let encoded = encode_identity_multihash(&data);
    assert!(encoded.starts_with('z'));
    let decoded = decode_identity_multihash(&encoded, 16).unwrap();
    assert_eq!(decoded, data);
  }

  #[test]
  fn identity_multihash_rejects_wrong_length() {
    let data = [7u8; 16];
    let encoded = encode_identity_multihash(&data);
    assert!(decode_identity_multihash(&encoded, 32).is_none());
  }

  #[test]
  fn identity_multihash_rejects_non_multibase_input() {
    assert!(decode_identity_multihash("not-multibase", 16).is_none());
  }

  #[test]
  fn multibase_header_round_trips_via_bs58() {
    let header = [0xec, 0x01];
    let key = [1u8; 32];
    let encoded = encode_multibase(&header, &key);
    assert!(encoded.starts_with('z'));
    let decoded = bs58::decode(&encoded[1..]).into_vec().unwrap();
    assert_eq!(&decoded[..2], &header);
    assert_eq!(&decoded[2..], &key);
  }
}
