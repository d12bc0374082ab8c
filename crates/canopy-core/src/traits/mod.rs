//! Core traits defined in `canopy-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
