//! Normalizing received gossip events
//!
//! A raw envelope goes through a fixed pipeline: decode the base64 fields,
//! verify the signature, resolve the sender's identities, then classify the
//! payload. Classification is trial decoding in a fixed order - naming
//! record, then UTF-8 text, then a best-effort JSON view of that text. The
//! payload format is not self-describing, so this order *is* the contract:
//! record-shaped bytes that fail record validation fall through to text, and
//! that is accepted behavior.

use chrono::Utc;

use crate::identity::{PeerId, PeerIdentity};
use crate::naming::{NameRecord, ValidatedRecord};

use super::verify::{verify_message, Verdict};
use super::wire::SignedEnvelope;
use super::PubsubError;

/// The decoded view of a verified event's payload
#[derive(Debug, Clone)]
pub enum Payload {
    /// A validated self-certifying naming record
    Record(ValidatedRecord),
    /// UTF-8 text, with a parsed JSON view when the text is valid JSON
    Text {
        text: String,
        json: Option<serde_json::Value>,
    },
    /// Bytes that matched no known payload shape
    Opaque(Vec<u8>),
}

/// A verified, normalized gossip event
#[derive(Debug, Clone)]
pub struct Event {
    /// The sender's resolved identity
    pub from: PeerIdentity,
    /// The sender's portable base64 public key, as carried on the wire
    pub from_b64: String,
    /// The sender's legacy multihash/base58 identifier
    pub from_peer_id: PeerId,
    /// The message sequence number
    pub seqno: Vec<u8>,
    /// Raw payload bytes
    pub data: Vec<u8>,
    /// Logical event type parsed from the topic, when present
    pub event_type: Option<String>,
    /// The classified payload
    pub payload: Payload,
}

/// Extract the logical event type from a topic of the form
/// `<legacy-id>/<event-type>`
///
/// Parsed only when the topic starts with the legacy identifier prefix; any
/// other topic shape carries no event type.
fn parse_event_type(topic: &str) -> Option<String> {
    if !topic.starts_with(PeerId::LEGACY_PREFIX) {
        return None;
    }
    topic.split('/').nth(1).map(str::to_string)
}

fn decode_payload(data: &[u8]) -> Payload {
    if let Ok(record) = NameRecord::unmarshal(data) {
        if let Ok(validated) = record.validate(Utc::now()) {
            return Payload::Record(validated);
        }
    }

    match std::str::from_utf8(data) {
        Ok(text) => Payload::Text {
            text: text.to_string(),
            json: serde_json::from_str(text).ok(),
        },
        Err(_) => Payload::Opaque(data.to_vec()),
    }
}

/// Verify and normalize a received envelope
///
/// Returns `Ok(None)` when the signature does not verify: a rejected event
/// is discarded, not raised as an error. Malformed envelope fields or key
/// material do fail the call.
pub fn normalize_event(
    topic: &str,
    envelope: &SignedEnvelope,
) -> Result<Option<Event>, PubsubError> {
    let data = envelope.data_bytes()?;
    let seqno = envelope.seqno_bytes()?;
    let signature = envelope.signature_bytes()?;

    match verify_message(&envelope.from, &data, &seqno, &signature)? {
        Verdict::Accepted => {}
        Verdict::Rejected => {
            tracing::warn!("discarding gossip event on '{}': signature not valid", topic);
            return Ok(None);
        }
    }

    let from = PeerIdentity::from_public_b64(&envelope.from)?;
    let from_peer_id = from.peer_id();
    let event_type = parse_event_type(topic);
    let payload = decode_payload(&data);

    Ok(Some(Event {
        from,
        from_b64: envelope.from.clone(),
        from_peer_id,
        seqno,
        data,
        event_type,
        payload,
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SecretKey;
    use crate::pubsub::sign_message;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use chrono::Duration;

    fn topic_for(secret: &SecretKey, event_type: &str) -> String {
        format!("{}/{}", PeerIdentity::from(secret.clone()).peer_id(), event_type)
    }

    #[test]
    fn test_text_event() {
        let secret = SecretKey::generate();
        let envelope = sign_message(&secret, "plain text, definitely not json").unwrap();

        let event = normalize_event("room", &envelope).unwrap().unwrap();
        match &event.payload {
            Payload::Text { text, json } => {
                assert_eq!(text, "plain text, definitely not json");
                assert!(json.is_none());
            }
            other => panic!("expected text payload, got {:?}", other),
        }
        assert_eq!(event.from_b64, envelope.from);
        assert!(event.event_type.is_none());
    }

    #[test]
    fn test_json_event_populates_both_views() {
        let secret = SecretKey::generate();
        let value = serde_json::json!({ "action": "announce", "seq": 7 });
        let envelope = sign_message(&secret, &value).unwrap();

        let event = normalize_event("room", &envelope).unwrap().unwrap();
        match &event.payload {
            Payload::Text { text, json } => {
                assert!(text.contains("announce"));
                assert_eq!(json.as_ref().unwrap(), &value);
            }
            other => panic!("expected text payload, got {:?}", other),
        }
    }

    #[test]
    fn test_record_event() {
        let publisher = SecretKey::generate();
        let sender = SecretKey::generate();

        let record = NameRecord::seal(
            &publisher,
            b"/data/target",
            1,
            Utc::now() + Duration::hours(1),
        );
        let envelope = sign_message(&sender, record.marshal().as_slice()).unwrap();

        let event = normalize_event("room", &envelope).unwrap().unwrap();
        match &event.payload {
            Payload::Record(validated) => {
                assert_eq!(validated.value_str.as_deref(), Some("/data/target"));
                assert_eq!(
                    validated.signer.peer_id(),
                    PeerIdentity::from(publisher).peer_id()
                );
            }
            other => panic!("expected record payload, got {:?}", other),
        }
        // The envelope sender and the record publisher are different peers
        assert_eq!(
            event.from_peer_id,
            PeerIdentity::from(sender).peer_id()
        );
    }

    #[test]
    fn test_expired_record_falls_through() {
        let secret = SecretKey::generate();
        let record = NameRecord::seal(&secret, b"stale", 1, Utc::now() - Duration::hours(1));
        let envelope = sign_message(&secret, record.marshal().as_slice()).unwrap();

        let event = normalize_event("room", &envelope).unwrap().unwrap();
        // An invalid record is not an error; the bytes reclassify as
        // text/opaque further down the chain
        assert!(!matches!(event.payload, Payload::Record(_)));
    }

    #[test]
    fn test_invalid_signature_discards_event() {
        let secret = SecretKey::generate();
        let mut envelope = sign_message(&secret, "hello").unwrap();
        envelope.data = BASE64.encode(b"tampered");

        assert!(normalize_event("room", &envelope).unwrap().is_none());
    }

    #[test]
    fn test_topic_event_type() {
        let secret = SecretKey::generate();
        let envelope = sign_message(&secret, "hello").unwrap();

        let topic = topic_for(&secret, "update");
        let event = normalize_event(&topic, &envelope).unwrap().unwrap();
        assert_eq!(event.event_type.as_deref(), Some("update"));

        // Topics without the legacy prefix carry no event type
        let event = normalize_event("plain/update", &envelope).unwrap().unwrap();
        assert!(event.event_type.is_none());
    }
}
