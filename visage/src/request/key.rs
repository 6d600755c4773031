//! Cache-key derivation.
//!
//! A cache key is the SHA-256 hex digest of the canonical JSON form of a
//! quantized payload. Quantization happens before derivation, so raw
//! gesture values never enter the hashed representation; neither do
//! session identifiers or timestamps, which would shatter the cache.

use sha2::{Digest, Sha256};

use super::payload::RenderPayload;

/// Client-side cache key: a pure function of the quantized payload.
///
/// Two semantically equal payloads always produce the same key regardless
/// of how they were constructed; any difference beyond quantization
/// rounding produces a different key.
pub fn payload_key(payload: &RenderPayload) -> String {
    hex_digest(payload.canonical_json().as_bytes())
}

/// Server-side cache key: the payload scoped to the model identifier.
///
/// Scoping keeps renders from different model versions apart in the
/// shared fast and durable stores.
pub fn scoped_key(model_identifier: &str, payload: &RenderPayload) -> String {
    // serde_json's Map is a BTreeMap, so the envelope keys are sorted
    // just like the payload's own.
    let envelope = serde_json::json!({
        "model_identifier": model_identifier,
        "input": payload,
    });
    hex_digest(envelope.to_string().as_bytes())
}

fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
