//! Server-side cache gateway.
//!
//! The gateway sits in front of the hosted model: it derives the server
//! cache path for a quantized payload, races the fast store and the
//! durable store, self-heals the fast store from durable-only hits, and
//! only on a full miss invokes the model — persisting the result behind
//! the response so cache writes never add latency to the caller.
//!
//! [`http`] exposes the gateway as the `POST /replicate` endpoint.

mod durable;
mod gateway;
pub mod http;
mod path;

pub use durable::{DurableStore, FsDurableStore};
pub use gateway::{AssetFetcher, CacheGateway, GatewayError, HttpAssetFetcher, Resolution};
pub use path::{CacheNamespace, CACHE_VERSION};
