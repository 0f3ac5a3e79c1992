//! In-process helpers for exercising the messaging and encryption layers in
//! tests, without external infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use common::testkit::TestPeer;
//!
//! let alice = TestPeer::new("alice");
//! let bob = TestPeer::new("bob");
//!
//! let envelope = common::pubsub::sign_message(&bob.secret, "hi alice")?;
//! let event = common::pubsub::normalize_event("room", &envelope)?;
//! ```

use std::collections::HashMap;

use crate::cipher::{transform_key, EncryptionKey};
use crate::crypto::SecretKey;
use crate::identity::PeerIdentity;
use crate::keystore::KeyStore;

/// A named peer with a fresh identity keypair
pub struct TestPeer {
    /// The name of this peer (for debugging)
    pub name: String,
    /// The peer's identity secret key
    pub secret: SecretKey,
}

impl TestPeer {
    /// Create a peer with a freshly generated key
    pub fn new(name: impl Into<String>) -> Self {
        TestPeer {
            name: name.into(),
            secret: SecretKey::generate(),
        }
    }

    /// The peer's full identity (public + secret)
    pub fn identity(&self) -> PeerIdentity {
        PeerIdentity::from(self.secret.clone())
    }

    /// The peer's keys in encryption form: `(private, public)`
    pub fn encryption_keys(&self) -> (EncryptionKey, EncryptionKey) {
        let private =
            transform_key(&self.secret.to_bytes(), false).expect("own key transforms");
        let public = transform_key(&self.secret.public().to_bytes(), true)
            .expect("own public key transforms");
        (private, public)
    }
}

/// An in-memory keychain holding PEM-encoded private keys behind a single
/// passphrase
pub struct MemoryKeyStore {
    pass: String,
    keys: HashMap<String, String>,
}

impl MemoryKeyStore {
    pub fn new(pass: impl Into<String>) -> Self {
        MemoryKeyStore {
            pass: pass.into(),
            keys: HashMap::new(),
        }
    }

    /// Store a key under a name, PEM-encoded the way a real keychain exports
    pub fn insert(&mut self, name: impl Into<String>, key: &SecretKey) {
        self.keys.insert(name.into(), key.to_pem());
    }
}

impl KeyStore for MemoryKeyStore {
    fn export_key(&self, name: &str, pass: &str) -> Result<String, anyhow::Error> {
        if pass != self.pass {
            anyhow::bail!("bad passphrase for key '{}'", name);
        }
        self.keys
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no key named '{}'", name))
    }
}
