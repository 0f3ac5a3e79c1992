//! Peer identities and their textual forms
//!
//! Two identifier schemes coexist on the network:
//!
//! - the **legacy identifier**: a sha2-256 multihash of the public key,
//!   rendered base58btc (always starting with "Qm"). The self-certifying
//!   naming layer keys its records by this form.
//! - the **portable public key**: the base64-encoded key itself, carried in
//!   the `from` field of every signed gossip message so receivers can verify
//!   statelessly, without resolving the legacy identifier first.
//!
//! This module is the only place that knows both schemes and converts
//! between them; no other module parses raw key bytes.

use std::fmt;

use cid::multibase::Base;
use multihash::Multihash;
use sha2::{Digest, Sha256};

use crate::crypto::{KeyError, PublicKey, SecretKey};

/// Multicodec code for sha2-256, the digest behind legacy identifiers
const SHA2_256_CODE: u64 = 0x12;

/// The legacy multihash/base58 form of a peer identifier
///
/// A `PeerId` carries its scheme by construction: it is always a sha2-256
/// multihash, parsed or derived exactly once. It cannot recover the public
/// key it was derived from; stateless verification uses the portable base64
/// key instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(Multihash<64>);

impl PeerId {
    /// Every sha2-256 multihash renders base58btc with this prefix. Topic
    /// names use it as a cheap marker for "starts with a legacy identifier".
    pub const LEGACY_PREFIX: &'static str = "Qm";

    /// Derive the identifier for a public key
    pub fn from_public_key(key: &PublicKey) -> Self {
        let digest = Sha256::digest(key.to_bytes());
        let multihash = Multihash::<64>::wrap(SHA2_256_CODE, digest.as_slice())
            .expect("sha2-256 digest fits");
        PeerId(multihash)
    }

    /// Parse an identifier from its base58 text form
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not base58btc or does not decode to a
    /// sha2-256 multihash.
    pub fn from_text(text: &str) -> Result<Self, KeyError> {
        let bytes = Base::Base58Btc
            .decode(text)
            .map_err(|_| anyhow::anyhow!("peer id base58 decode error"))?;
        let multihash = Multihash::<64>::from_bytes(&bytes)
            .map_err(|_| anyhow::anyhow!("peer id is not a valid multihash"))?;
        if multihash.code() != SHA2_256_CODE {
            return Err(anyhow::anyhow!("peer id is not a sha2-256 multihash").into());
        }
        Ok(PeerId(multihash))
    }

    /// Raw multihash bytes of the identifier
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Base::Base58Btc.encode(self.0.to_bytes()))
    }
}

/// A peer's cryptographic identity
///
/// Binds a public key, and optionally the matching secret key, to its stable
/// textual identifiers. Created from raw key bytes on demand and never
/// mutated.
#[derive(Debug, Clone)]
pub struct PeerIdentity {
    public: PublicKey,
    secret: Option<SecretKey>,
}

impl From<PublicKey> for PeerIdentity {
    fn from(public: PublicKey) -> Self {
        PeerIdentity {
            public,
            secret: None,
        }
    }
}

impl From<SecretKey> for PeerIdentity {
    fn from(secret: SecretKey) -> Self {
        PeerIdentity {
            public: secret.public(),
            secret: Some(secret),
        }
    }
}

impl PeerIdentity {
    /// Build an identity from raw public key bytes
    ///
    /// Deterministic: equal key bytes always produce equal identifiers.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed key bytes.
    pub fn from_public_key(bytes: &[u8]) -> Result<Self, KeyError> {
        Ok(PublicKey::try_from(bytes)?.into())
    }

    /// Build an identity from raw secret key bytes, deriving the public
    /// component
    ///
    /// # Errors
    ///
    /// Returns an error on malformed key bytes.
    pub fn from_secret_key(bytes: &[u8]) -> Result<Self, KeyError> {
        Ok(SecretKey::try_from(bytes)?.into())
    }

    /// Build an identity from a portable base64 public key
    pub fn from_public_b64(text: &str) -> Result<Self, KeyError> {
        Ok(PublicKey::from_b64(text)?.into())
    }

    /// Build an identity from a base64 secret key
    pub fn from_secret_b64(text: &str) -> Result<Self, KeyError> {
        Ok(SecretKey::from_b64(text)?.into())
    }

    /// The identity's public key
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// The identity's secret key, when it was built from one
    pub fn secret(&self) -> Option<&SecretKey> {
        self.secret.as_ref()
    }

    /// The legacy multihash/base58 identifier for this identity
    pub fn peer_id(&self) -> PeerId {
        PeerId::from_public_key(&self.public)
    }

    /// The portable base64 public key for this identity
    pub fn public_b64(&self) -> String {
        self.public.to_b64()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_public_and_secret_derivations_agree() {
        let secret = SecretKey::generate();

        let from_secret = PeerIdentity::from_secret_key(&secret.to_bytes()).unwrap();
        let from_public =
            PeerIdentity::from_public_key(&secret.public().to_bytes()).unwrap();

        assert_eq!(from_secret.peer_id(), from_public.peer_id());
        assert_eq!(from_secret.public_b64(), from_public.public_b64());
        assert!(from_secret.secret().is_some());
        assert!(from_public.secret().is_none());
    }

    #[test]
    fn test_peer_id_text_round_trip() {
        let identity = PeerIdentity::from(SecretKey::generate());
        let peer_id = identity.peer_id();

        let text = peer_id.to_string();
        assert!(text.starts_with(PeerId::LEGACY_PREFIX));

        let parsed = PeerId::from_text(&text).unwrap();
        assert_eq!(peer_id, parsed);
    }

    #[test]
    fn test_peer_id_is_deterministic() {
        let identity = PeerIdentity::from(SecretKey::generate());
        assert_eq!(identity.peer_id(), identity.peer_id());
    }

    #[test]
    fn test_portable_b64_round_trip() {
        let identity = PeerIdentity::from(SecretKey::generate());
        let recovered = PeerIdentity::from_public_b64(&identity.public_b64()).unwrap();
        assert_eq!(identity.peer_id(), recovered.peer_id());
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        assert!(PeerIdentity::from_public_key(&[0u8; 7]).is_err());
        assert!(PeerIdentity::from_public_b64("@@@").is_err());
        assert!(PeerId::from_text("not-base58-0OIl").is_err());
    }
}
