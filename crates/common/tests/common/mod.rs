//! Shared test utilities for messaging integration tests
#![allow(dead_code)]

use ::common::testkit::TestPeer;

/// Initialize tracing from RUST_LOG for debugging test runs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Flip a single bit inside base64 text by round-tripping through bytes
pub fn flip_bit_b64(encoded: &str, byte_index: usize, bit: u8) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    let mut bytes = STANDARD.decode(encoded).unwrap();
    let idx = byte_index % bytes.len();
    bytes[idx] ^= 1 << (bit % 8);
    STANDARD.encode(bytes)
}

/// The cast of characters most tests want
pub fn alice_and_bob() -> (TestPeer, TestPeer) {
    (TestPeer::new("alice"), TestPeer::new("bob"))
}
