//! Building signed gossip messages

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::crypto::SecretKey;

use super::wire::{canonical_bytes, SignedEnvelope, SEQNO_SIZE};
use super::PubsubError;

/// Outbound payload forms accepted by the signer
///
/// JSON values are serialized, text is UTF-8 encoded, bytes pass through
/// unchanged. The receiver's fallback chain undoes this classification.
#[derive(Debug, Clone)]
pub enum MessageBody<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
    Json(&'a serde_json::Value),
}

impl<'a> From<&'a [u8]> for MessageBody<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        MessageBody::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for MessageBody<'a> {
    fn from(text: &'a str) -> Self {
        MessageBody::Text(text)
    }
}

impl<'a> From<&'a serde_json::Value> for MessageBody<'a> {
    fn from(value: &'a serde_json::Value) -> Self {
        MessageBody::Json(value)
    }
}

impl MessageBody<'_> {
    fn into_bytes(self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            MessageBody::Bytes(bytes) => Ok(bytes.to_vec()),
            MessageBody::Text(text) => Ok(text.as_bytes().to_vec()),
            MessageBody::Json(value) => serde_json::to_vec(value),
        }
    }
}

/// Sign a payload into a transport-ready envelope
///
/// Derives the `from` field from the signing key, draws a fresh 8-byte
/// sequence number from the OS CSPRNG, signs the canonical bytes, and
/// base64-encodes every field. No retries; failures surface to the caller.
pub fn sign_message<'a>(
    secret: &SecretKey,
    body: impl Into<MessageBody<'a>>,
) -> Result<SignedEnvelope, PubsubError> {
    let data = body.into().into_bytes()?;
    let from = secret.public().to_b64();

    let mut seqno = [0u8; SEQNO_SIZE];
    getrandom::getrandom(&mut seqno)
        .map_err(|e| anyhow::anyhow!("failed to generate seqno: {}", e))?;

    let signature = secret.sign(&canonical_bytes(&data, &from, &seqno));

    Ok(SignedEnvelope {
        data: BASE64.encode(&data),
        from,
        seqno: BASE64.encode(seqno),
        signature: BASE64.encode(signature.to_bytes()),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sign_produces_fresh_seqno() {
        let secret = SecretKey::generate();

        let first = sign_message(&secret, "hello").unwrap();
        let second = sign_message(&secret, "hello").unwrap();

        assert_eq!(first.seqno_bytes().unwrap().len(), SEQNO_SIZE);
        assert_ne!(first.seqno, second.seqno);
        assert_ne!(first.signature, second.signature);
    }

    #[test]
    fn test_body_normalization() {
        let secret = SecretKey::generate();

        let from_text = sign_message(&secret, "hi").unwrap();
        assert_eq!(from_text.data_bytes().unwrap(), b"hi");

        let from_bytes = sign_message(&secret, b"hi".as_slice()).unwrap();
        assert_eq!(from_bytes.data_bytes().unwrap(), b"hi");

        let value = serde_json::json!({ "kind": "greeting" });
        let from_json = sign_message(&secret, &value).unwrap();
        assert_eq!(
            from_json.data_bytes().unwrap(),
            serde_json::to_vec(&value).unwrap()
        );
    }

    #[test]
    fn test_from_is_portable_public_key() {
        let secret = SecretKey::generate();
        let envelope = sign_message(&secret, "hello").unwrap();
        assert_eq!(envelope.from, secret.public().to_b64());
    }
}
