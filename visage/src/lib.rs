//! Visage - request quantization, caching and coalescing for
//! interactive face editing.
//!
//! Visage sits between live gesture input and a slow, hosted
//! image-generation model. Continuous gesture values are snapped onto a
//! bucket lattice, fingerprinted into cache keys, and resolved through a
//! chain of cache tiers before anything crosses the network. In-flight
//! requests are superseded by newer gesture state, and bounded batch
//! sweeps pre-populate the caches for entire parameter spaces.
//!
//! # Architecture
//!
//! ```text
//! gesture input ──► RequestCoordinator ──► ServerCacheGateway ──► ModelInvoker
//!                   (quantize, key,        (fast store ∥          (submit + poll)
//!                    memory/disk tiers,     durable store,
//!                    supersession,          backfill,
//!                    debounce)              write-behind)
//!                   PrefetchBatchGenerator
//!                   (grid sweeps, bounded gate)
//! ```
//!
//! The client side ([`coordinator`], [`prefetch`]) and server side
//! ([`server`], [`invoker`]) share the quantizer, payload and key
//! derivation, so both ends of the wire agree on what a request *is*.

pub mod cache;
pub mod coordinator;
pub mod face;
pub mod invoker;
pub mod metrics;
pub mod prefetch;
pub mod quantize;
pub mod request;
pub mod server;

pub use cache::{DiskStore, MemoryStore, TieredCache};
pub use coordinator::{DebouncedResolver, RequestCoordinator, ResolveOptions};
pub use face::{face_controls, Axis, FaceValues};
pub use invoker::{ModelInvoker, ModelRunner};
pub use prefetch::PrefetchBatchGenerator;
pub use quantize::{Quantizer, QuantizerConfig};
pub use request::{payload_key, scoped_key, EditRequest, RenderPayload};
pub use server::{CacheGateway, CacheNamespace};
