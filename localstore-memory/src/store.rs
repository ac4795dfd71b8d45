//! In-memory storage implementation of the document store.
//!
//! Documents live in nested HashMaps (type -> guid -> document) behind a single
//! async-aware read-write lock, together with the set of guids the store has issued.

use std::{collections::HashSet, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;

use localstore_core::{
    backend::StoreBackend,
    document::{Document, Fields, StoreMap},
    error::{DocumentStoreError, DocumentStoreResult},
    guid::{GuidSource, RandomGuid, issue_guid},
};


/// Everything guarded by the store lock.
#[derive(Debug)]
struct StoreState {
    /// type name -> (guid -> document)
    collections: StoreMap,
    /// Every guid ever handed out by this store, including deleted ones
    issued: HashSet<String>,
    guids: Box<dyn GuidSource>,
}

/// Thread-safe in-memory document store.
///
/// This struct implements [`StoreBackend`] entirely in memory. Collections are
/// created implicitly by the first insert for a type name and are never dropped.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so
/// clones share the same documents. Every operation takes the lock once and holds
/// it for its whole check-then-mutate sequence; in particular guid minting and
/// insertion happen under one write guard, which is what keeps guids unique.
///
/// # Example
///
/// ```ignore
/// use localstore_memory::InMemoryStore;
/// use localstore_core::backend::StoreBackend;
/// use serde_json::json;
///
/// let store = InMemoryStore::new();
/// let fields = json!({ "name": "Alice" }).as_object().cloned().unwrap();
///
/// let docs = store.insert_documents("users", vec![fields]).await?;
/// assert_eq!(store.list_documents("users").await?.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// Creates a new empty store using random guids.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use localstore_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder()
    ///     .with_snapshot(snapshot)
    ///     .build();
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Number of documents across all types.
    pub async fn document_count(&self) -> usize {
        self.state
            .read()
            .await
            .collections
            .values()
            .map(|c| c.len())
            .sum()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, type_name: &str, fields: Vec<Fields>) -> DocumentStoreResult<Vec<Document>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let mut guard = self.state.write().await;
        let StoreState { collections, issued, guids } = &mut *guard;

        let collection = collections
            .entry(type_name.to_string())
            .or_default();

        let mut created = Vec::with_capacity(fields.len());

        for fields in fields {
            let guid = issue_guid(guids.as_mut(), issued);
            let doc = Document::new(guid.clone(), type_name, fields);

            collection.insert(guid, doc.clone());
            created.push(doc);
        }

        tracing::debug!(type_name, count = created.len(), "created documents");

        Ok(created)
    }

    async fn get_document(&self, type_name: &str, guid: &str) -> DocumentStoreResult<Option<Document>> {
        let state = self.state.read().await;
        let collection = match state.collections.get(type_name) {
            Some(col) => col,
            None => return Err(DocumentStoreError::UnknownType(type_name.to_string())),
        };

        Ok(collection.get(guid).cloned())
    }

    async fn replace_fields(&self, type_name: &str, guid: &str, fields: Fields) -> DocumentStoreResult<Document> {
        let mut state = self.state.write().await;
        let doc = state
            .collections
            .get_mut(type_name)
            .and_then(|col| col.get_mut(guid))
            .ok_or_else(|| DocumentStoreError::NotFound(guid.to_string(), type_name.to_string()))?;

        doc.fields = fields;

        tracing::debug!(type_name, guid, "replaced document fields");

        Ok(doc.clone())
    }

    async fn remove_document(&self, type_name: &str, guid: &str) -> DocumentStoreResult<Option<Document>> {
        let mut state = self.state.write().await;
        let removed = state
            .collections
            .get_mut(type_name)
            .and_then(|col| col.remove(guid));

        if removed.is_some() {
            tracing::debug!(type_name, guid, "deleted document");
        }

        Ok(removed)
    }

    async fn list_documents(&self, type_name: &str) -> DocumentStoreResult<Vec<Document>> {
        let state = self.state.read().await;
        let collection = match state.collections.get(type_name) {
            Some(col) => col,
            None => return Err(DocumentStoreError::UnknownType(type_name.to_string())),
        };

        Ok(
            collection
                .values()
                .cloned()
                .collect()
        )
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.state
                .read()
                .await
                .collections
                .keys()
                .cloned()
                .collect()
        )
    }

    async fn snapshot(&self) -> DocumentStoreResult<StoreMap> {
        Ok(self.state.read().await.collections.clone())
    }

    async fn restore(&self, snapshot: StoreMap) -> DocumentStoreResult<()> {
        let mut state = self.state.write().await;

        // Guids issued before the restore stay retired.
        state.issued.extend(
            snapshot
                .values()
                .flat_map(|col| col.keys().cloned())
        );
        state.collections = snapshot;

        Ok(())
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use localstore_memory::InMemoryStore;
///
/// let store = InMemoryStore::builder()
///     .guid_source(MyDeterministicGuids::default())
///     .build();
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    guid_source: Option<Box<dyn GuidSource>>,
    snapshot: Option<StoreMap>,
}

impl InMemoryStoreBuilder {
    /// Replaces the random guid source, e.g. with a deterministic one in tests.
    pub fn guid_source(mut self, source: impl GuidSource + 'static) -> Self {
        self.guid_source = Some(Box::new(source));
        self
    }

    /// Pre-populates the store with `snapshot`.
    pub fn with_snapshot(mut self, snapshot: StoreMap) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Builds and returns a new [`InMemoryStore`].
    pub fn build(self) -> InMemoryStore {
        let collections = self.snapshot.unwrap_or_default();
        let issued = collections
            .values()
            .flat_map(|col| col.keys().cloned())
            .collect();

        InMemoryStore {
            state: Arc::new(RwLock::new(StoreState {
                collections,
                issued,
                guids: self
                    .guid_source
                    .unwrap_or_else(|| Box::new(RandomGuid)),
            })),
        }
    }
}
