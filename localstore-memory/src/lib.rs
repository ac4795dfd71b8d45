//! In-memory document store backend for localstore.
//!
//! This crate provides the thread-safe, in-memory implementation of the `StoreBackend`
//! trait that stands in for the hosted document store during local development.
//!
//! # Features
//!
//! - **Type-partitioned storage** - type -> guid -> document, collections created on first insert
//! - **Store-wide unique guids** - every issued guid is tracked, including deleted ones
//! - **Replace-not-merge updates** - an update swaps the whole field object
//! - **Snapshot support** - the whole store can be copied out and restored
//!
//! # Quick Start
//!
//! ```ignore
//! use localstore_core::{dispatch::Dispatcher, request::Request};
//! use localstore_memory::InMemoryStore;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(InMemoryStore::new());
//!
//!     let created = dispatcher
//!         .dispatch(Request::create("users", json!({ "name": "Alice" })))
//!         .await?;
//!
//!     println!("{}", created.to_json()?);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as localstore_memory;

pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
