//! Expiring key-value cache for localstore.
//!
//! A local stand-in for the hosted cache API: `save`, `load` and `remove` string
//! values under keys, with every entry evicted after its expiry (24 hours unless
//! saved with an explicit one). The cache is independent of the document store.
//!
//! # Quick Start
//!
//! ```ignore
//! use localstore_cache::{CacheRequest, ExpiringCache};
//!
//! let cache = ExpiringCache::new();
//! cache.dispatch(CacheRequest::save("session", "abc123", Some(3600))).await?;
//! let loaded = cache.dispatch(CacheRequest::load("session")).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as localstore_cache;

pub mod cache;
pub mod error;

pub use cache::{CacheRequest, CacheResponse, ExpiringCache};
pub use error::{CacheError, CacheResult};
