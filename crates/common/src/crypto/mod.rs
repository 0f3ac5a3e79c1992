//! Cryptographic primitives for Gale
//!
//! This module provides the cryptographic foundation for the messaging core:
//!
//! - **Identity & Authentication**: Ed25519 keypairs for peer identity and
//!   gossip message signatures
//! - **Payload Encryption**: ChaCha20-Poly1305 with a fresh key per sealed
//!   payload
//! - **Key Wrapping**: ECDH-based per-recipient wrapping using X25519 curve
//!   conversion
//!
//! # Security Model
//!
//! ## Peer Identity
//! Each peer has one long-lived Ed25519 keypair (`SecretKey`/`PublicKey`).
//! The same keypair signs gossip messages and, converted to X25519, opens
//! payloads encrypted to the peer.
//!
//! ## Payload Encryption
//! Every sealed payload has its own `Secret`. To deliver it to N recipients
//! the secret is wrapped N times (ephemeral X25519 ECDH + AES-KW); any one
//! recipient key recovers the secret and with it the payload.

mod keys;
mod secret;
mod secret_share;

pub use ed25519_dalek::Signature;
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use secret::{Secret, SecretError, SECRET_SIZE};
pub use secret_share::{SecretShare, SecretShareError, SECRET_SHARE_SIZE};
