//! Storage backend abstraction for the document store.
//!
//! The [`StoreBackend`] trait is the seam between the request layer (the
//! [`Dispatcher`](crate::dispatch::Dispatcher) and the
//! [`SnapshotGateway`](crate::persist::SnapshotGateway)) and the structure that
//! actually holds documents. Implementations must be thread-safe (`Send + Sync`)
//! and must run each operation's check-then-mutate sequence under one exclusive
//! lock, so that concurrent callers never observe or produce a half-applied change.
//!
//! # Examples
//!
//! ```ignore
//! use localstore_core::backend::StoreBackend;
//!
//! let docs = backend.insert_documents("users", vec![fields]).await?;
//! let same = backend.get_document("users", &docs[0].guid).await?;
//! assert_eq!(same.as_ref(), docs.first());
//! ```

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    document::{Document, Fields, StoreMap},
    error::DocumentStoreResult,
};

/// Abstract interface for document storage backends.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Each method documents which error variants it may produce; argument presence is
/// checked by the dispatcher before a backend is called.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts one new document per element of `fields` into the collection for `type_name`.
    ///
    /// The collection is created if it does not exist. Every document receives a
    /// guid that has never been issued by this backend before, across all types.
    ///
    /// # Arguments
    ///
    /// * `type_name` - The type (collection) to insert into
    /// * `fields` - The field objects, one per new document
    ///
    /// # Returns
    ///
    /// The created documents, in the order of `fields`.
    async fn insert_documents(
        &self,
        type_name: &str,
        fields: Vec<Fields>,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Retrieves a single document.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the type exists but holds no document with `guid`.
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::UnknownType`](crate::error::DocumentStoreError::UnknownType)
    /// when no collection exists for `type_name`.
    async fn get_document(&self, type_name: &str, guid: &str) -> DocumentStoreResult<Option<Document>>;

    /// Replaces the fields of an existing document wholesale.
    ///
    /// # Returns
    ///
    /// The updated document; its guid and type are unchanged.
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::NotFound`](crate::error::DocumentStoreError::NotFound)
    /// when `type_name` + `guid` does not resolve to a document.
    async fn replace_fields(
        &self,
        type_name: &str,
        guid: &str,
        fields: Fields,
    ) -> DocumentStoreResult<Document>;

    /// Removes a document, handing back the removed value.
    ///
    /// A missing type or guid is not an error and yields `Ok(None)`.
    async fn remove_document(&self, type_name: &str, guid: &str) -> DocumentStoreResult<Option<Document>>;

    /// Lists every document of one type, in no particular order.
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::UnknownType`](crate::error::DocumentStoreError::UnknownType)
    /// when no collection exists for `type_name`.
    async fn list_documents(&self, type_name: &str) -> DocumentStoreResult<Vec<Document>>;

    /// Lists the names of all collections, in no particular order.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Copies the entire store out for persistence.
    async fn snapshot(&self) -> DocumentStoreResult<StoreMap>;

    /// Replaces the entire store with `snapshot`.
    ///
    /// Implementations must treat every guid in the snapshot as already issued.
    async fn restore(&self, snapshot: StoreMap) -> DocumentStoreResult<()>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_documents(
        &self,
        type_name: &str,
        fields: Vec<Fields>,
    ) -> DocumentStoreResult<Vec<Document>> {
        (*self)
            .insert_documents(type_name, fields)
            .await
    }

    async fn get_document(&self, type_name: &str, guid: &str) -> DocumentStoreResult<Option<Document>> {
        (*self)
            .get_document(type_name, guid)
            .await
    }

    async fn replace_fields(
        &self,
        type_name: &str,
        guid: &str,
        fields: Fields,
    ) -> DocumentStoreResult<Document> {
        (*self)
            .replace_fields(type_name, guid, fields)
            .await
    }

    async fn remove_document(&self, type_name: &str, guid: &str) -> DocumentStoreResult<Option<Document>> {
        (*self)
            .remove_document(type_name, guid)
            .await
    }

    async fn list_documents(&self, type_name: &str) -> DocumentStoreResult<Vec<Document>> {
        (*self).list_documents(type_name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        (*self).list_collections().await
    }

    async fn snapshot(&self) -> DocumentStoreResult<StoreMap> {
        (*self).snapshot().await
    }

    async fn restore(&self, snapshot: StoreMap) -> DocumentStoreResult<()> {
        (*self).restore(snapshot).await
    }
}
