//! Checking gossip message signatures
//!
//! A failed signature check is a routine outcome - stale messages and
//! forgeries are expected on an open network - so it comes back as
//! [`Verdict::Rejected`], not an error. Only malformed key material fails
//! the call itself.

use crate::crypto::Signature;
use crate::identity::PeerIdentity;

use super::wire::{canonical_bytes, SignedEnvelope};
use super::PubsubError;

/// Outcome of a signature check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The signature covers the canonical bytes under the sender's key
    Accepted,
    /// The signature does not verify; the message must not be treated as
    /// authentic
    Rejected,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Verify a message against its claimed sender
///
/// Resolves the public key from the portable base64 `from` field, recomputes
/// the canonical bytes, and checks the Ed25519 signature.
///
/// # Errors
///
/// Fails only on malformed key material. A signature that merely does not
/// match - including one of the wrong length - is `Ok(Verdict::Rejected)`.
pub fn verify_message(
    from: &str,
    data: &[u8],
    seqno: &[u8],
    signature: &[u8],
) -> Result<Verdict, PubsubError> {
    let identity = PeerIdentity::from_public_b64(from)?;
    let bytes = canonical_bytes(data, from, seqno);

    let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
        return Ok(Verdict::Rejected);
    };
    let signature = Signature::from_bytes(&sig_bytes);

    match identity.public().verify(&bytes, &signature) {
        Ok(()) => Ok(Verdict::Accepted),
        Err(_) => Ok(Verdict::Rejected),
    }
}

/// Verify a transport envelope in place, decoding its base64 fields first
pub fn verify_envelope(envelope: &SignedEnvelope) -> Result<Verdict, PubsubError> {
    verify_message(
        &envelope.from,
        &envelope.data_bytes()?,
        &envelope.seqno_bytes()?,
        &envelope.signature_bytes()?,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SecretKey;
    use crate::pubsub::sign_message;

    #[test]
    fn test_signed_envelope_verifies() {
        let secret = SecretKey::generate();
        let envelope = sign_message(&secret, "test").unwrap();
        assert_eq!(verify_envelope(&envelope).unwrap(), Verdict::Accepted);
    }

    #[test]
    fn test_short_signature_is_rejected_not_fatal() {
        let secret = SecretKey::generate();
        let envelope = sign_message(&secret, "test").unwrap();

        let verdict = verify_message(
            &envelope.from,
            &envelope.data_bytes().unwrap(),
            &envelope.seqno_bytes().unwrap(),
            &[0u8; 12],
        )
        .unwrap();
        assert_eq!(verdict, Verdict::Rejected);
    }

    #[test]
    fn test_malformed_from_is_fatal() {
        assert!(verify_message("@@not-a-key@@", b"x", &[0; 8], &[0; 64]).is_err());
    }
}
