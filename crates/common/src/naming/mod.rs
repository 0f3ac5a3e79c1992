//! Self-certifying naming records
//!
//! A record binds a value to the key that published it. The record carries
//! its own public key, a sequence number for replacement ordering, and a
//! validity deadline; verification uses only the embedded key. The gossip
//! envelope that delivered the record plays no part - a record is exactly as
//! trustworthy as its own signature.

use chrono::{DateTime, Utc};
use prost::Message as _;

use crate::crypto::{KeyError, PublicKey, SecretKey, Signature};
use crate::identity::PeerIdentity;

/// Domain-separation tag for record signatures
pub const RECORD_SIGN_PREFIX: &[u8] = b"gale-record-1:";

/// Validity scheme: the record is valid until the embedded deadline
pub const VALIDITY_DEADLINE: u32 = 0;

/// Errors from record decoding and validation
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("record wire decode error: {0}")]
    Wire(#[from] prost::DecodeError),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("record signature does not verify")]
    BadSignature,
    #[error("record validity deadline has passed")]
    Expired,
}

/// Wire form of a naming record
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NameRecord {
    /// The bound value
    #[prost(bytes = "vec", tag = "1")]
    pub value: Vec<u8>,
    /// Signature over the domain-separated record bytes
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
    /// Validity scheme discriminant; only `VALIDITY_DEADLINE` is defined
    #[prost(uint32, tag = "3")]
    pub validity_type: u32,
    /// RFC 3339 deadline, UTF-8
    #[prost(bytes = "vec", tag = "4")]
    pub validity: Vec<u8>,
    /// Replacement ordering between records for the same key
    #[prost(uint64, tag = "5")]
    pub sequence: u64,
    /// The publisher's Ed25519 public key
    #[prost(bytes = "vec", tag = "6")]
    pub public_key: Vec<u8>,
}

/// A record whose embedded signature and validity deadline have been checked
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
    /// The bound value
    pub value: Vec<u8>,
    /// UTF-8 view of the value, when it is text
    pub value_str: Option<String>,
    /// Replacement ordering
    pub sequence: u64,
    /// When the record stops being valid
    pub valid_until: DateTime<Utc>,
    /// The identity that published the record
    pub signer: PeerIdentity,
}

fn record_signed_bytes(value: &[u8], validity: &[u8], validity_type: u32) -> Vec<u8> {
    let mut bytes = RECORD_SIGN_PREFIX.to_vec();
    bytes.extend_from_slice(value);
    bytes.extend_from_slice(validity);
    bytes.extend_from_slice(&validity_type.to_be_bytes());
    bytes
}

impl NameRecord {
    /// Decode a record from its wire bytes
    ///
    /// Decoding is shape-only; call [`NameRecord::validate`] before trusting
    /// anything in the record.
    pub fn unmarshal(bytes: &[u8]) -> Result<Self, RecordError> {
        Ok(NameRecord::decode(bytes)?)
    }

    /// Encode the record to its wire bytes
    pub fn marshal(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Create and sign a record binding `value` to the signer's key until
    /// `valid_until`
    pub fn seal(
        secret: &SecretKey,
        value: &[u8],
        sequence: u64,
        valid_until: DateTime<Utc>,
    ) -> Self {
        let validity = valid_until.to_rfc3339().into_bytes();
        let signature =
            secret.sign(&record_signed_bytes(value, &validity, VALIDITY_DEADLINE));

        NameRecord {
            value: value.to_vec(),
            signature: signature.to_bytes().to_vec(),
            validity_type: VALIDITY_DEADLINE,
            validity,
            sequence,
            public_key: secret.public().to_bytes().to_vec(),
        }
    }

    /// Check the record against its own embedded public key and deadline
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded key is malformed, the signature does
    /// not verify, the validity field is unreadable, or the deadline has
    /// passed at `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidatedRecord, RecordError> {
        let public = PublicKey::try_from(self.public_key.as_slice())?;

        if self.validity_type != VALIDITY_DEADLINE {
            return Err(anyhow::anyhow!(
                "unsupported validity scheme {}",
                self.validity_type
            )
            .into());
        }

        let Ok(sig_bytes) = <[u8; 64]>::try_from(self.signature.as_slice()) else {
            return Err(RecordError::BadSignature);
        };
        let signature = Signature::from_bytes(&sig_bytes);
        let signed = record_signed_bytes(&self.value, &self.validity, self.validity_type);
        public
            .verify(&signed, &signature)
            .map_err(|_| RecordError::BadSignature)?;

        let validity_text = std::str::from_utf8(&self.validity)
            .map_err(|_| anyhow::anyhow!("record validity is not UTF-8"))?;
        let valid_until = DateTime::parse_from_rfc3339(validity_text)
            .map_err(|e| anyhow::anyhow!("record validity is not RFC 3339: {}", e))?
            .with_timezone(&Utc);

        if now > valid_until {
            return Err(RecordError::Expired);
        }

        Ok(ValidatedRecord {
            value: self.value.clone(),
            value_str: String::from_utf8(self.value.clone()).ok(),
            sequence: self.sequence,
            valid_until,
            signer: PeerIdentity::from(public),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_seal_validate_round_trip() {
        let secret = SecretKey::generate();
        let now = Utc::now();

        let record = NameRecord::seal(&secret, b"/data/some-target", 3, now + Duration::hours(1));
        let wire = record.marshal();

        let decoded = NameRecord::unmarshal(&wire).unwrap();
        let validated = decoded.validate(now).unwrap();

        assert_eq!(validated.value, b"/data/some-target");
        assert_eq!(validated.value_str.as_deref(), Some("/data/some-target"));
        assert_eq!(validated.sequence, 3);
        assert_eq!(
            validated.signer.peer_id(),
            PeerIdentity::from(secret).peer_id()
        );
    }

    #[test]
    fn test_expired_record_rejected() {
        let secret = SecretKey::generate();
        let now = Utc::now();

        let record = NameRecord::seal(&secret, b"value", 0, now - Duration::minutes(5));
        assert!(matches!(record.validate(now), Err(RecordError::Expired)));
    }

    #[test]
    fn test_tampered_value_rejected() {
        let secret = SecretKey::generate();
        let now = Utc::now();

        let mut record = NameRecord::seal(&secret, b"value", 0, now + Duration::hours(1));
        record.value = b"other".to_vec();

        assert!(matches!(
            record.validate(now),
            Err(RecordError::BadSignature)
        ));
    }

    #[test]
    fn test_record_signed_with_foreign_key_rejected() {
        let publisher = SecretKey::generate();
        let imposter = SecretKey::generate();
        let now = Utc::now();

        let mut record = NameRecord::seal(&publisher, b"value", 0, now + Duration::hours(1));
        // Claim the record belongs to a different key
        record.public_key = imposter.public().to_bytes().to_vec();

        assert!(matches!(
            record.validate(now),
            Err(RecordError::BadSignature)
        ));
    }

    #[test]
    fn test_garbage_bytes_do_not_validate() {
        // Random text often decodes as a protobuf shape; validation is what
        // actually rejects it
        if let Ok(record) = NameRecord::unmarshal(b"hello world, not a record") {
            assert!(record.validate(Utc::now()).is_err());
        }
    }
}
