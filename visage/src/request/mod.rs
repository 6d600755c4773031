//! Request payloads and cache-key derivation.
//!
//! A [`RenderPayload`] is the quantized wire form of a single render
//! request; [`payload_key`] and [`scoped_key`] turn one into the SHA-256
//! fingerprint used across every cache tier.

mod key;
mod payload;

pub use key::{payload_key, scoped_key};
pub use payload::{EditRequest, OutputFormat, OutputSettings, RenderPayload};
