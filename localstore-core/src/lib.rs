//! Core of localstore, an in-process stand-in for an action-based JSON document store API.
//!
//! This crate provides:
//!
//! - **Documents** ([`document`]) - The `{guid, type, fields}` record and field validation
//! - **Guid generation** ([`guid`]) - Fixed-width hex guids, unique per store
//! - **Requests and responses** ([`request`]) - The action-based API shape
//! - **Store backend abstraction** ([`backend`]) - The trait a document store implements
//! - **Dispatching** ([`dispatch`]) - Routing requests to backend operations
//! - **Persistence** ([`persist`]) - Snapshot hydration and flushing, plus the readiness gate
//! - **Configuration** ([`config`]) - Compile-time defaults
//! - **Error handling** ([`error`]) - The error taxonomy and result type
//!
//! # Example
//!
//! ```ignore
//! use localstore_core::{dispatch::Dispatcher, request::Request};
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new(backend);
//! let doc = dispatcher
//!     .dispatch(Request::create("users", json!({ "name": "Alice" })))
//!     .await?
//!     .into_document()
//!     .unwrap();
//!
//! let read = dispatcher.dispatch(Request::read("users", &doc.guid)).await?;
//! assert_eq!(read.as_document(), Some(&doc));
//! ```

#[allow(unused_extern_crates)]
extern crate self as localstore_core;

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod guid;
pub mod persist;
pub mod request;
