//! Identity-keyed payload encryption
//!
//! Lets two peers exchange a payload end-to-end encrypted using the same
//! long-lived Ed25519 keys that back their gossip identities. Keys are first
//! re-encoded into the encryption subsystem's X25519 form
//! ([`transform_key`]); a payload is then signed by every sender key,
//! encrypted once under a fresh content key, and the content key is wrapped
//! once per recipient. Any single recipient key opens the message.
//!
//! Shares carry no recipient hint: a decrypting peer probes each share with
//! its own key and relies on the wrap's integrity check to find the one that
//! belongs to it.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::crypto::{
    KeyError, PublicKey, Secret, SecretError, SecretKey, SecretShare, SecretShareError, Signature,
};

/// Domain-separation tag for embedded payload signatures
pub const PAYLOAD_SIGN_PREFIX: &[u8] = b"gale-sealed-1:";

/// Errors from payload encryption and decryption
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("cipher error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    #[error("share error: {0}")]
    Share(#[from] SecretShareError),
    /// No candidate key opened the payload
    #[error("no candidate key can open this payload")]
    DecryptionFailed,
    /// Verification keys were supplied but no embedded signature matched
    #[error("no embedded signature verifies against the supplied keys")]
    VerificationFailed,
}

/// An identity key re-encoded for the encryption subsystem
///
/// Derived from raw Ed25519 key material via [`transform_key`]; never
/// mutated after creation. The public half encrypts-to and verifies-with,
/// the private half decrypts-with and signs-with.
#[derive(Clone)]
pub enum EncryptionKey {
    Public {
        /// Ed25519 key for checking embedded signatures
        verify: PublicKey,
        /// X25519 key the content key is wrapped to
        agree: X25519PublicKey,
    },
    Private {
        /// Ed25519 key for producing embedded signatures
        sign: SecretKey,
        /// X25519 secret that unwraps the content key
        agree: StaticSecret,
    },
}

/// Re-encode a native Ed25519 key into the encryption subsystem's form
///
/// # Errors
///
/// Fails on malformed key bytes, or on a public key that has no Montgomery
/// form.
pub fn transform_key(raw: &[u8], is_public: bool) -> Result<EncryptionKey, KeyError> {
    if is_public {
        let verify = PublicKey::try_from(raw)?;
        let agree = verify.to_x25519()?;
        Ok(EncryptionKey::Public { verify, agree })
    } else {
        let sign = SecretKey::try_from(raw)?;
        let agree = sign.to_x25519();
        Ok(EncryptionKey::Private { sign, agree })
    }
}

/// One embedded signature over the plaintext
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PayloadSignature {
    /// The signer's Ed25519 public key bytes
    signer: Vec<u8>,
    /// Ed25519 signature over the domain-separated plaintext
    signature: Vec<u8>,
}

/// The signed plaintext bundle, serialized and then encrypted as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignedText {
    text: String,
    signatures: Vec<PayloadSignature>,
}

/// The armored container: per-recipient shares plus the encrypted bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SealedPayload {
    shares: Vec<SecretShare>,
    body: Vec<u8>,
}

fn recipient_agree_key(key: &EncryptionKey) -> X25519PublicKey {
    match key {
        EncryptionKey::Public { agree, .. } => *agree,
        EncryptionKey::Private { agree, .. } => X25519PublicKey::from(agree),
    }
}

/// Encrypt a payload to `recipients`, signed by every key in `signers`
///
/// Returns an armored (base64) ciphertext. Any one recipient key can open
/// it; every signer produces an embedded signature recipients can check.
///
/// # Errors
///
/// Fails if a signer key is public-only, or on serialization/encryption
/// failure. No retries; the caller decides what to do.
pub fn encrypt(
    signers: &[EncryptionKey],
    recipients: &[EncryptionKey],
    plaintext: &str,
) -> Result<String, CipherError> {
    let mut signed_bytes = PAYLOAD_SIGN_PREFIX.to_vec();
    signed_bytes.extend_from_slice(plaintext.as_bytes());

    let mut signatures = Vec::with_capacity(signers.len());
    for signer in signers {
        let EncryptionKey::Private { sign, .. } = signer else {
            return Err(anyhow::anyhow!("signing requires a private key").into());
        };
        signatures.push(PayloadSignature {
            signer: sign.public().to_bytes().to_vec(),
            signature: sign.sign(&signed_bytes).to_bytes().to_vec(),
        });
    }

    let bundle = SignedText {
        text: plaintext.to_string(),
        signatures,
    };
    let bundle_bytes = bincode::serialize(&bundle)
        .map_err(|e| anyhow::anyhow!("failed to serialize payload bundle: {}", e))?;

    let content = Secret::generate();
    let body = content.encrypt(&bundle_bytes)?;

    let mut shares = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        shares.push(SecretShare::new(&content, &recipient_agree_key(recipient))?);
    }

    let sealed = SealedPayload { shares, body };
    let sealed_bytes = bincode::serialize(&sealed)
        .map_err(|e| anyhow::anyhow!("failed to serialize sealed payload: {}", e))?;

    Ok(BASE64.encode(sealed_bytes))
}

/// Decrypt an armored payload with whichever candidate key matches
///
/// When `verification` is non-empty, at least one embedded signature must
/// verify against one of those keys.
///
/// # Errors
///
/// - [`CipherError::DecryptionFailed`] when no candidate private key opens
///   any share
/// - [`CipherError::VerificationFailed`] when verification keys are supplied
///   and none matches an embedded signature
/// - A fatal error on malformed armor
pub fn decrypt(
    candidates: &[EncryptionKey],
    verification: &[EncryptionKey],
    armored: &str,
) -> Result<String, CipherError> {
    let sealed_bytes = BASE64
        .decode(armored)
        .map_err(|_| anyhow::anyhow!("sealed payload is not valid base64"))?;
    let sealed: SealedPayload = bincode::deserialize(&sealed_bytes)
        .map_err(|e| anyhow::anyhow!("malformed sealed payload: {}", e))?;

    let bundle_bytes = open_body(candidates, &sealed).ok_or(CipherError::DecryptionFailed)?;
    let bundle: SignedText = bincode::deserialize(&bundle_bytes)
        .map_err(|e| anyhow::anyhow!("malformed payload bundle: {}", e))?;

    if !verification.is_empty() && !any_signature_verifies(verification, &bundle) {
        return Err(CipherError::VerificationFailed);
    }

    Ok(bundle.text)
}

fn open_body(candidates: &[EncryptionKey], sealed: &SealedPayload) -> Option<Vec<u8>> {
    for candidate in candidates {
        let EncryptionKey::Private { agree, .. } = candidate else {
            continue;
        };
        for share in &sealed.shares {
            // The wrap's integrity check rejects shares meant for other keys
            let Ok(secret) = share.recover(agree) else {
                continue;
            };
            if let Ok(bundle_bytes) = secret.decrypt(&sealed.body) {
                return Some(bundle_bytes);
            }
        }
    }
    None
}

fn any_signature_verifies(verification: &[EncryptionKey], bundle: &SignedText) -> bool {
    let mut signed_bytes = PAYLOAD_SIGN_PREFIX.to_vec();
    signed_bytes.extend_from_slice(bundle.text.as_bytes());

    verification.iter().any(|key| {
        let verify = match key {
            EncryptionKey::Public { verify, .. } => *verify,
            EncryptionKey::Private { sign, .. } => sign.public(),
        };
        bundle.signatures.iter().any(|entry| {
            if entry.signer != verify.to_bytes() {
                return false;
            }
            let Ok(sig_bytes) = <[u8; 64]>::try_from(entry.signature.as_slice()) else {
                return false;
            };
            verify
                .verify(&signed_bytes, &Signature::from_bytes(&sig_bytes))
                .is_ok()
        })
    })
}
