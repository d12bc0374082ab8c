//! # canopy-cache
//!
//! Cache providers and result memoization for Canopy. Supports two modes:
//!
//! - **memory**: In-process cache using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration. On top of
//! the provider sits [`ResultCache`], which memoizes folder-tree and
//! permission computations and invalidates them with a generation counter.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod memo;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use memo::ResultCache;
pub use provider::CacheManager;
