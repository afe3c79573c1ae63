// Copyright 2020-2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic primitives backing the secret vault: password-based key
//! derivation, AES key wrap, HMAC for blinded attributes, and the two
//! supported key-agreement key types (X25519 for the `"recommended"` cipher
//! suite, P-256 for the `"fips"` cipher suite).

mod error;
mod hmac;
mod kek;
mod p256_kak;
mod pbkdf;
mod x25519_kak;

pub use self::error::CryptoError;
pub use self::error::Result;
pub use self::hmac::Hmac;
pub use self::kek::Kek;
pub use self::p256_kak::P256Kak;
pub use self::pbkdf::derive_bits;
pub use self::pbkdf::DerivedBits;
pub use self::pbkdf::Pbkdf2Options;
pub use self::pbkdf::ITERATIONS;
pub use self::pbkdf::SALT_SIZE;
pub use self::x25519_kak::X25519Kak;
