//! Boundary to the external keychain
//!
//! Key storage belongs to the embedding node, not to this crate. The node
//! exposes its keychain through [`KeyStore`]; this module only defines the
//! contract and the lookup path on top of it. Key material is supplied
//! synchronously and is not cached here.

use crate::crypto::SecretKey;

/// Reserved key name meaning "this node's own identity key"
///
/// Resolved directly, without going through the export path.
pub const SELF_KEY_NAME: &str = "self";

/// Errors from key lookup
#[derive(Debug, thiserror::Error)]
pub enum KeystoreError {
    /// The external keychain could not produce the requested key
    #[error("cannot get key '{name}': {source}")]
    CannotGetKey {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// The export contract an external keychain must provide
///
/// Implementations return the named private key PEM-encoded, unlocked with
/// `pass`.
pub trait KeyStore {
    fn export_key(&self, name: &str, pass: &str) -> Result<String, anyhow::Error>;
}

/// Resolve a named key, treating [`SELF_KEY_NAME`] as the node's own key
///
/// # Errors
///
/// Any export or PEM-decode failure wraps into
/// [`KeystoreError::CannotGetKey`]; lookups are never retried.
pub fn lookup_key(
    store: &dyn KeyStore,
    own_key: &SecretKey,
    name: &str,
    pass: &str,
) -> Result<SecretKey, KeystoreError> {
    if name == SELF_KEY_NAME {
        return Ok(own_key.clone());
    }

    let wrap = |source: anyhow::Error| {
        tracing::error!("key lookup for '{}' failed: {}", name, source);
        KeystoreError::CannotGetKey {
            name: name.to_string(),
            source,
        }
    };

    let pem = store.export_key(name, pass).map_err(wrap)?;
    SecretKey::from_pem(&pem).map_err(|e| wrap(e.into()))
}
