//! The per-process handle wiring backend, dispatcher and snapshot gateway together.
//!
//! [`LocalDb`] mirrors the lifecycle of the hosted service: it is opened at process
//! start (hydration from the snapshot is spawned in the background), serves requests
//! once hydration has completed, and flushes the store back to the snapshot when it
//! is shut down.

use serde_json::Value;
use std::path::{Path, PathBuf};

use localstore_core::{
    backend::StoreBackend,
    config::SNAPSHOT_PATH_ENV,
    dispatch::Dispatcher,
    error::{DocumentStoreError, DocumentStoreResult},
    persist::SnapshotGateway,
    request::{Request, Response},
};
use localstore_memory::InMemoryStore;

/// A local document store for one process.
///
/// # Example
///
/// ```ignore
/// use localstore::{LocalDb, request::Request};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = LocalDb::builder().build().await?;
///
///     let created = db
///         .dispatch(Request::create("users", json!({ "name": "Alice" })))
///         .await?;
///     println!("{}", created.to_json()?);
///
///     db.shutdown().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct LocalDb<B: StoreBackend = InMemoryStore> {
    dispatcher: Dispatcher<B>,
    gateway: SnapshotGateway,
}

impl LocalDb<InMemoryStore> {
    /// A builder for an in-memory store. Use [`LocalDbBuilder::backend`] to swap the backend.
    pub fn builder() -> LocalDbBuilder<InMemoryStore> {
        LocalDbBuilder::default()
    }
}

impl<B: StoreBackend> LocalDb<B> {
    /// Handles one request, waiting for hydration first.
    pub async fn dispatch(&self, request: Request) -> DocumentStoreResult<Response> {
        self.dispatcher.dispatch(request).await
    }

    /// Handles one request given and answered in its JSON form.
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::Serialization`] if `request` is not a request object,
    /// otherwise whatever [`dispatch`](Self::dispatch) reports.
    pub async fn dispatch_json(&self, request: Value) -> DocumentStoreResult<Value> {
        self.dispatch(Request::from_json(request)?)
            .await?
            .to_json()
    }

    pub fn is_ready(&self) -> bool {
        self.dispatcher.readiness().is_ready()
    }

    /// Waits until the snapshot load attempt has completed.
    pub async fn wait_ready(&self) {
        self.dispatcher.readiness().wait().await
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        self.dispatcher.backend()
    }

    /// Where the snapshot lives, or `None` when persistence is disabled.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.gateway.path()
    }

    /// Writes the backend to the snapshot now. Returns `true` on success.
    pub async fn flush(&self) -> bool {
        self.wait_ready().await;
        self.gateway.flush(self.backend()).await
    }

    /// Flushes the backend to the snapshot and releases it.
    ///
    /// Waits for hydration first so an in-flight load is never overwritten by an
    /// empty store. A failed flush is logged, not returned.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.flush().await;
        self.dispatcher.shutdown().await
    }
}

/// Builder for [`LocalDb`].
///
/// By default the snapshot is persisted at `.localstore/db.json` under the
/// working directory, backed by a fresh [`InMemoryStore`].
#[derive(Debug)]
pub struct LocalDbBuilder<B = InMemoryStore> {
    snapshot_path: Option<PathBuf>,
    persistence: bool,
    backend: B,
}

impl Default for LocalDbBuilder<InMemoryStore> {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            persistence: true,
            backend: InMemoryStore::new(),
        }
    }
}

impl<B> LocalDbBuilder<B>
where
    B: StoreBackend + Clone + 'static,
{
    /// Persists the snapshot at `path` instead of the default location.
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Enables or disables snapshot persistence.
    pub fn persistence(mut self, enabled: bool) -> Self {
        self.persistence = enabled;
        self
    }

    /// Uses `backend` instead, e.g. an [`InMemoryStore`] with a custom guid source.
    ///
    /// Clones of the backend must share state: hydration runs against one clone
    /// while requests are served through another.
    pub fn backend<C>(self, backend: C) -> LocalDbBuilder<C>
    where
        C: StoreBackend + Clone + 'static,
    {
        LocalDbBuilder {
            snapshot_path: self.snapshot_path,
            persistence: self.persistence,
            backend,
        }
    }

    /// Applies the `LOCALSTORE_SNAPSHOT_PATH` override, if set.
    ///
    /// An empty value disables persistence.
    pub fn from_env(self) -> Self {
        match std::env::var(SNAPSHOT_PATH_ENV) {
            Ok(path) if path.is_empty() => self.persistence(false),
            Ok(path) => self.snapshot_path(path),
            Err(_) => self,
        }
    }

    /// Opens the store and spawns hydration from the snapshot on the current tokio runtime.
    ///
    /// Returns as soon as hydration has been spawned; requests dispatched before it
    /// completes wait for it. If the hydration task is dropped before finishing, for
    /// instance because its runtime shut down, waiting requests are released anyway.
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::Initialization`] when called outside a tokio runtime.
    pub async fn build(self) -> DocumentStoreResult<LocalDb<B>> {
        let gateway = if self.persistence {
            SnapshotGateway::new(
                self.snapshot_path
                    .unwrap_or_else(SnapshotGateway::default_path),
            )
        } else {
            SnapshotGateway::disabled()
        };

        if !gateway.readiness().is_ready() {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

            let hydrating = gateway.clone();
            let target = self.backend.clone();
            let guard = gateway.readiness().guard();

            runtime.spawn(async move {
                let _guard = guard;
                hydrating.hydrate(&target).await
            });
        }

        tracing::debug!(snapshot = ?gateway.path(), "opened local store");

        Ok(LocalDb {
            dispatcher: Dispatcher::with_readiness(self.backend, gateway.readiness()),
            gateway,
        })
    }
}
