//! Per-recipient key wrapping using ECDH + AES Key Wrap
//!
//! A sealed payload is encrypted once under a fresh [`Secret`]; that secret
//! is then wrapped once per recipient. Wrapping combines an ephemeral X25519
//! Diffie-Hellman exchange with AES Key Wrap (RFC 3394):
//!
//! 1. Generate an ephemeral X25519 keypair
//! 2. Perform ECDH against the recipient's key-agreement public key
//! 3. Use the shared secret as a KEK to wrap the payload secret
//! 4. Package `[ephemeral_pubkey || wrapped_secret]`
//!
//! The recipient reverses the exchange with their static secret. AES-KW
//! authenticates the wrapped key, so unwrapping with the wrong key fails
//! rather than yielding garbage - this is what lets a recipient probe an
//! anonymous multi-recipient payload for the share that belongs to them.

use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use aes_kw::KekAes256 as Kek;

use super::secret::{Secret, SecretError, SECRET_SIZE};

/// Size of an X25519 public key in bytes
const KEX_PUBLIC_SIZE: usize = 32;
/// Overhead AES-KW adds to the wrapped secret in bytes
const KW_OVERHEAD: usize = 8;
/// Total size of a share in bytes
///
/// Layout: ephemeral_pubkey (32) || wrapped_secret (40) = 72 bytes
pub const SECRET_SHARE_SIZE: usize = KEX_PUBLIC_SIZE + SECRET_SIZE + KW_OVERHEAD;

/// Errors that can occur during share creation or recovery
#[derive(Debug, thiserror::Error)]
pub enum SecretShareError {
    #[error("share error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

/// A payload secret wrapped for a single recipient
///
/// Contains an ephemeral X25519 public key and the AES-KW wrapped secret.
/// Only the holder of the matching static secret can recover the payload
/// secret; anyone else fails the AES-KW integrity check.
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 32 bytes ][ wrapped_secret: 40 bytes ]
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SecretShare(pub(crate) [u8; SECRET_SHARE_SIZE]);

impl Serialize for SecretShare {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretShare {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};
        use std::fmt;

        struct ShareVisitor;

        impl<'de> Visitor<'de> for ShareVisitor {
            type Value = SecretShare;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "{} bytes", SECRET_SHARE_SIZE)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: Error,
            {
                SecretShare::try_from(v).map_err(|_| E::invalid_length(v.len(), &self))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(SECRET_SHARE_SIZE);
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                SecretShare::try_from(bytes.as_slice())
                    .map_err(|_| A::Error::invalid_length(bytes.len(), &self))
            }
        }

        // Bytes for CBOR/bincode, seq fallback for JSON
        deserializer.deserialize_byte_buf(ShareVisitor)
    }
}

impl Default for SecretShare {
    fn default() -> Self {
        SecretShare([0; SECRET_SHARE_SIZE])
    }
}

impl From<[u8; SECRET_SHARE_SIZE]> for SecretShare {
    fn from(bytes: [u8; SECRET_SHARE_SIZE]) -> Self {
        SecretShare(bytes)
    }
}

impl TryFrom<&[u8]> for SecretShare {
    type Error = SecretShareError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != SECRET_SHARE_SIZE {
            return Err(anyhow::anyhow!(
                "invalid share size, expected {}, got {}",
                SECRET_SHARE_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut share = SecretShare::default();
        share.0.copy_from_slice(bytes);
        Ok(share)
    }
}

impl SecretShare {
    /// Wrap a payload secret for a recipient's X25519 key-agreement key
    ///
    /// # Errors
    ///
    /// Returns an error if the AES-KW wrap fails.
    pub fn new(secret: &Secret, recipient: &X25519PublicKey) -> Result<Self, SecretShareError> {
        // Ephemeral X25519 keypair for this share only
        let mut ephemeral_bytes = [0u8; 32];
        getrandom::getrandom(&mut ephemeral_bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate ephemeral key: {}", e))?;
        let ephemeral_secret = StaticSecret::from(ephemeral_bytes);
        let ephemeral_public = X25519PublicKey::from(&ephemeral_secret);

        let shared_secret = ephemeral_secret.diffie_hellman(recipient);

        let kek = Kek::from(shared_secret.to_bytes());
        let wrapped = kek
            .wrap_vec(secret.bytes())
            .map_err(|_| anyhow::anyhow!("AES-KW wrap error"))?;

        if wrapped.len() != SECRET_SIZE + KW_OVERHEAD {
            return Err(anyhow::anyhow!("wrapped secret has unexpected size").into());
        }

        let mut share = SecretShare::default();
        share.0[..KEX_PUBLIC_SIZE].copy_from_slice(ephemeral_public.as_bytes());
        share.0[KEX_PUBLIC_SIZE..].copy_from_slice(&wrapped);

        Ok(share)
    }

    /// Recover the wrapped secret with the recipient's X25519 static secret
    ///
    /// # Errors
    ///
    /// Returns an error if AES-KW unwrapping fails. That means either the
    /// share was wrapped for a different recipient, or the data was
    /// corrupted or tampered with.
    pub fn recover(&self, recipient: &StaticSecret) -> Result<Secret, SecretShareError> {
        let mut ephemeral_bytes = [0u8; KEX_PUBLIC_SIZE];
        ephemeral_bytes.copy_from_slice(&self.0[..KEX_PUBLIC_SIZE]);
        let ephemeral_public = X25519PublicKey::from(ephemeral_bytes);

        let shared_secret = recipient.diffie_hellman(&ephemeral_public);

        let kek = Kek::from(shared_secret.to_bytes());
        let unwrapped = kek
            .unwrap_vec(&self.0[KEX_PUBLIC_SIZE..])
            .map_err(|_| anyhow::anyhow!("AES-KW unwrap error"))?;

        Ok(Secret::from_slice(&unwrapped)?)
    }

    /// Get a reference to the raw share bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}
