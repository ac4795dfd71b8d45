//! Action routing.
//!
//! The [`Dispatcher`] is the request-level entry point: it waits for the store to be
//! hydrated, resolves the action selector, checks the arguments that action needs and
//! forwards to the matching [`StoreBackend`] operation.
//!
//! # Example
//!
//! ```ignore
//! use localstore_core::{dispatch::Dispatcher, request::Request};
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new(backend);
//! let created = dispatcher
//!     .dispatch(Request::create("users", json!({ "name": "Alice" })))
//!     .await?;
//! ```

use crate::{
    backend::StoreBackend,
    document::{fields_batch, fields_object},
    error::DocumentStoreResult,
    persist::Readiness,
    request::{Action, CreateSummary, DocumentList, Request, Response},
};

/// Routes requests to a backend.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct Dispatcher<B: StoreBackend> {
    backend: B,
    readiness: Readiness,
}

impl<B: StoreBackend> Dispatcher<B> {
    /// Creates a dispatcher that admits requests immediately.
    pub fn new(backend: B) -> Self {
        Self::with_readiness(backend, Readiness::ready())
    }

    /// Creates a dispatcher that holds every request until `readiness` fires.
    pub fn with_readiness(backend: B, readiness: Readiness) -> Self {
        Self { backend, readiness }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Handles a single request.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnknownAction`](crate::error::DocumentStoreError::UnknownAction)
    /// without touching the backend when the selector is absent or unrecognized, and
    /// otherwise whatever the routed operation reports.
    pub async fn dispatch(&self, request: Request) -> DocumentStoreResult<Response> {
        self.readiness.wait().await;

        let action = request.action()?;
        tracing::debug!(%action, type_name = ?request.type_name, guid = ?request.guid, "dispatching");

        match action {
            Action::Create => self.create(request).await,
            Action::Read => self.read(request).await,
            Action::Update => self.update(request).await,
            Action::List => self.list(request).await,
            Action::Delete => self.delete(request).await,
        }
    }

    async fn create(&self, mut request: Request) -> DocumentStoreResult<Response> {
        let fields = request.fields.take();
        let type_name = request.require_type()?;
        let batch = fields_batch(fields)?;

        let mut created = self
            .backend
            .insert_documents(type_name, batch)
            .await?;

        Ok(match created.len() {
            1 => Response::Document(created.remove(0)),
            count => Response::Created(CreateSummary::ok(count)),
        })
    }

    async fn read(&self, request: Request) -> DocumentStoreResult<Response> {
        let type_name = request.require_type()?;
        let guid = request.require_guid()?;

        Ok(self
            .backend
            .get_document(type_name, guid)
            .await?
            .into())
    }

    async fn update(&self, mut request: Request) -> DocumentStoreResult<Response> {
        let fields = request.fields.take();
        let type_name = request.require_type()?;
        let guid = request.require_guid()?;
        let fields = fields_object(fields)?;

        Ok(Response::Document(
            self.backend
                .replace_fields(type_name, guid, fields)
                .await?,
        ))
    }

    async fn list(&self, request: Request) -> DocumentStoreResult<Response> {
        let type_name = request.require_type()?;

        Ok(Response::List(DocumentList::from(
            self.backend
                .list_documents(type_name)
                .await?,
        )))
    }

    async fn delete(&self, request: Request) -> DocumentStoreResult<Response> {
        let type_name = request.require_type()?;
        let guid = request.require_guid()?;

        Ok(self
            .backend
            .remove_document(type_name, guid)
            .await?
            .into())
    }

    /// Consumes the dispatcher and shuts the backend down.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}
