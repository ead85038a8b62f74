//! Cryptographic primitives for agentvc.
//!
//! Provides kind-framed SHA-256 object hashing, Ed25519 signing and
//! verification, the `"ed25519:<base64>"` public-key field encoding, agent
//! identities, and on-disk key storage.
//!
//! Signing uses `ed25519-dalek`; hashing uses `sha2`.

pub mod error;
pub mod hasher;
pub mod identity;
pub mod keystore;
pub mod signer;

pub use error::{CryptoError, CryptoResult};
pub use hasher::{sha256_hex, ContentHasher};
pub use identity::Identity;
pub use keystore::KeyStore;
pub use signer::{Signature, SigningKey, VerifyingKey, PUBLIC_KEY_SCHEME};
