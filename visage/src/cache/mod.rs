//! Cache tiers for resolved image URLs.
//!
//! Every tier implements the same minimal [`UrlStore`] interface: string
//! key in, resolved asset URL out. The client chains a memory tier and a
//! persistent tier through [`TieredCache`]; the server reuses the same
//! trait for its fast store, paired with the prefix-addressed
//! [durable store](crate::server::DurableStore).
//!
//! Tier failures are an availability concern, not a correctness one:
//! the chain logs them and degrades to a miss rather than surfacing an
//! error to the request path.

mod disk;
mod memory;
mod tiered;
mod traits;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use tiered::TieredCache;
pub use traits::{BoxFuture, StoreError, UrlStore};
