//! Canonical wire encoding for signed gossip messages
//!
//! The byte sequence a signature covers is:
//!
//! ```text
//! SIGN_PREFIX || protobuf({ data, from, seqno })
//! ```
//!
//! The protobuf encoding is deterministic: fields are written in fixed tag
//! order with length prefixes, and the struct only contains the three signed
//! fields, so the signature and transport metadata can never leak into the
//! signed bytes. Signer and verifier must agree on these bytes exactly.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use prost::Message as _;
use serde::{Deserialize, Serialize};

use super::PubsubError;

/// Domain-separation tag prepended to every signed message.
///
/// Versioned: envelopes signed under a different prefix never cross-verify.
pub const SIGN_PREFIX: &[u8] = b"gale-pubsub-1:";

/// Length of a message sequence number in bytes
pub const SEQNO_SIZE: usize = 8;

/// The signed portion of a gossip message
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WireMessage {
    /// Raw payload bytes
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
    /// Sender's portable base64 public key
    #[prost(string, tag = "2")]
    pub from: String,
    /// Fresh random bytes, unique per message
    #[prost(bytes = "vec", tag = "3")]
    pub seqno: Vec<u8>,
}

/// Compute the exact bytes a message signature is computed over
///
/// Pure: equal inputs always produce identical bytes.
pub fn canonical_bytes(data: &[u8], from: &str, seqno: &[u8]) -> Vec<u8> {
    let message = WireMessage {
        data: data.to_vec(),
        from: from.to_string(),
        seqno: seqno.to_vec(),
    };
    let mut bytes = SIGN_PREFIX.to_vec();
    bytes.extend(message.encode_to_vec());
    bytes
}

/// A signed gossip message as it travels between peers
///
/// All fields are base64 text, so the envelope serializes cleanly over JSON
/// transports; binary transports carry the same fields decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// Payload bytes, base64
    pub data: String,
    /// Sender's portable base64 public key
    pub from: String,
    /// 8 random bytes, base64
    pub seqno: String,
    /// Ed25519 signature over the canonical bytes, base64
    pub signature: String,
}

impl SignedEnvelope {
    /// Decoded payload bytes
    pub fn data_bytes(&self) -> Result<Vec<u8>, PubsubError> {
        Ok(BASE64.decode(&self.data)?)
    }

    /// Decoded sequence number bytes
    pub fn seqno_bytes(&self) -> Result<Vec<u8>, PubsubError> {
        Ok(BASE64.decode(&self.seqno)?)
    }

    /// Decoded signature bytes
    pub fn signature_bytes(&self) -> Result<Vec<u8>, PubsubError> {
        Ok(BASE64.decode(&self.signature)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_canonical_bytes_idempotent() {
        let first = canonical_bytes(b"payload", "c29tZS1rZXk=", &[1, 2, 3, 4, 5, 6, 7, 8]);
        let second = canonical_bytes(b"payload", "c29tZS1rZXk=", &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_canonical_bytes_start_with_prefix() {
        let bytes = canonical_bytes(b"x", "k", &[0; 8]);
        assert!(bytes.starts_with(SIGN_PREFIX));
    }

    #[test]
    fn test_canonical_bytes_distinguish_fields() {
        let base = canonical_bytes(b"payload", "from", &[0; 8]);
        assert_ne!(base, canonical_bytes(b"payloae", "from", &[0; 8]));
        assert_ne!(base, canonical_bytes(b"payload", "form", &[0; 8]));
        assert_ne!(base, canonical_bytes(b"payload", "from", &[1; 8]));
    }

    #[test]
    fn test_envelope_field_decoding() {
        let envelope = SignedEnvelope {
            data: "aGVsbG8=".to_string(),
            from: "anything".to_string(),
            seqno: "AAECAwQFBgc=".to_string(),
            signature: "!!!not-base64".to_string(),
        };

        assert_eq!(envelope.data_bytes().unwrap(), b"hello");
        assert_eq!(envelope.seqno_bytes().unwrap(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(envelope.signature_bytes().is_err());
    }
}
