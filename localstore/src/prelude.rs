//! Convenient re-exports of commonly used types from localstore.
//!
//! ```ignore
//! use localstore::prelude::*;
//! ```
//!
//! This provides access to:
//! - The per-process handle and its builder
//! - Requests, responses and documents
//! - The store backend trait, the in-memory store and the dispatcher
//! - The expiring cache
//! - Error types

pub use crate::local::{LocalDb, LocalDbBuilder};
pub use localstore_cache::{CacheError, CacheRequest, CacheResponse, ExpiringCache};
pub use localstore_core::{
    backend::StoreBackend,
    dispatch::Dispatcher,
    document::{Document, Fields},
    error::{DocumentStoreError, DocumentStoreResult},
    persist::{Readiness, ReadinessGuard, SnapshotGateway},
    request::{Action, CreateSummary, DocumentList, Request, Response},
};
pub use localstore_memory::InMemoryStore;
