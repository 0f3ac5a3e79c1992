//! Authenticated gossip messaging
//!
//! The send path normalizes a payload to bytes, derives the sender's
//! portable key, draws a fresh sequence number, and signs the canonical
//! encoding ([`wire`]). The receive path decodes the envelope, verifies the
//! signature against the key carried in `from`, and classifies the payload
//! ([`event`]). Verification is stateless: everything needed travels with
//! the message.

mod event;
mod sign;
mod verify;
mod wire;

pub use event::{normalize_event, Event, Payload};
pub use sign::{sign_message, MessageBody};
pub use verify::{verify_envelope, verify_message, Verdict};
pub use wire::{canonical_bytes, SignedEnvelope, WireMessage, SEQNO_SIZE, SIGN_PREFIX};

use crate::crypto::KeyError;

/// Errors from signing, verification, and normalization
///
/// A signature that fails to verify is *not* represented here; routine
/// rejection comes back as [`Verdict::Rejected`] or a discarded event.
#[derive(Debug, thiserror::Error)]
pub enum PubsubError {
    #[error("pubsub error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("payload serialization error: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("envelope field is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
}
