//! Main localstore crate: a local, in-process stand-in for a hosted document store API.
//!
//! Client code issues the same action-based requests it would send to the hosted
//! service (`create`, `read`, `update`, `list`, `delete` against named types of
//! schemaless JSON documents) and gets back the same result shapes, while all data
//! lives in memory and survives restarts through a JSON snapshot file.
//!
//! # Features
//!
//! - **Action-based requests** - Typed constructors or raw JSON, routed by a dispatcher
//! - **Store-wide unique guids** - 24-character hex identifiers, never reissued
//! - **Replace-not-merge updates** - An update swaps the whole field object
//! - **Snapshot persistence** - Hydrated at startup, flushed at shutdown, best effort
//! - **Expiring cache** - An independent save/load/remove key-value facade
//!
//! # Quick Start
//!
//! ```ignore
//! use localstore::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Hydrates from .localstore/db.json in the background
//!     let db = LocalDb::builder().from_env().build().await?;
//!
//!     // Create a single document; the response carries its new guid
//!     let user = db
//!         .dispatch(Request::create("users", json!({ "name": "Alice" })))
//!         .await?
//!         .into_document()
//!         .unwrap();
//!
//!     // Replace its fields wholesale
//!     db.dispatch(Request::update("users", &user.guid, json!({ "name": "Alicia" })))
//!         .await?;
//!
//!     // Or talk JSON, exactly like the hosted API
//!     let listed = db
//!         .dispatch_json(json!({ "action": "list", "type": "users" }))
//!         .await?;
//!     println!("{listed}");
//!
//!     // Flush the snapshot before exiting
//!     db.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - The in-memory document store
//! - [`cache`] - The expiring key-value cache

pub mod local;
pub mod prelude;

pub use local::{LocalDb, LocalDbBuilder};
pub use localstore_core::{backend, config, dispatch, document, error, guid, persist, request};

/// In-memory document store.
pub mod memory {
    pub use localstore_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// Expiring key-value cache.
pub mod cache {
    pub use localstore_cache::{CacheError, CacheRequest, CacheResponse, CacheResult, ExpiringCache};
}
