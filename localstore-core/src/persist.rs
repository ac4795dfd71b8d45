//! Snapshot persistence at process boundaries.
//!
//! The [`SnapshotGateway`] hydrates a backend from a JSON snapshot file at startup
//! and flushes the whole backend back to that file at shutdown. Both directions are
//! best effort: a missing, unreadable or inconsistent snapshot leaves the store empty,
//! and a failed flush is logged and swallowed.
//!
//! Hydration completes a [`Readiness`] handle whether it succeeded or not. The
//! dispatcher waits on that handle before admitting any request.

use mea::latch::Latch;
use std::{
    collections::HashSet,
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    backend::StoreBackend,
    config::{DEFAULT_SNAPSHOT_DIR, DEFAULT_SNAPSHOT_FILE},
    document::StoreMap,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// A one-shot signal that hydration has finished.
///
/// Clones share the same signal.
#[derive(Clone)]
pub struct Readiness {
    inner: Arc<ReadinessInner>,
}

struct ReadinessInner {
    latch: Latch,
    ready: AtomicBool,
    abandoned: AtomicBool,
}

impl Readiness {
    /// A signal that has not fired yet.
    pub fn pending() -> Self {
        Self {
            inner: Arc::new(ReadinessInner {
                latch: Latch::new(1),
                ready: AtomicBool::new(false),
                abandoned: AtomicBool::new(false),
            }),
        }
    }

    /// A signal that has already fired.
    pub fn ready() -> Self {
        let readiness = Self::pending();
        readiness.mark_ready();
        readiness
    }

    /// Fires the signal. Later calls are no-ops.
    pub fn mark_ready(&self) {
        if !self.inner.ready.swap(true, Ordering::AcqRel) {
            self.inner.latch.count_down();
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    /// Whether the signal was fired by a dropped [`ReadinessGuard`] rather than by
    /// a completed hydration.
    pub fn is_abandoned(&self) -> bool {
        self.inner.abandoned.load(Ordering::Acquire)
    }

    /// A guard that fires the signal when dropped.
    ///
    /// Moved into a hydration task, it releases waiting requests even if the task
    /// is dropped before it completes.
    pub fn guard(&self) -> ReadinessGuard {
        ReadinessGuard(self.clone())
    }

    /// Waits until the signal has fired.
    pub async fn wait(&self) {
        if self.is_ready() {
            return;
        }
        self.inner.latch.wait().await;
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Readiness")
            .field("ready", &self.is_ready())
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::pending()
    }
}

/// Fires a [`Readiness`] on drop. See [`Readiness::guard`].
#[derive(Debug)]
pub struct ReadinessGuard(Readiness);

impl Drop for ReadinessGuard {
    fn drop(&mut self) {
        if !self.0.is_ready() {
            tracing::warn!("hydration abandoned before completing, releasing requests");
            self.0.inner.abandoned.store(true, Ordering::Release);
            self.0.mark_ready();
        }
    }
}

/// Loads and flushes whole-store snapshots.
#[derive(Clone, Debug)]
pub struct SnapshotGateway {
    path: Option<PathBuf>,
    readiness: Readiness,
}

impl SnapshotGateway {
    /// A gateway persisting to `path`, with readiness pending until [`hydrate`](Self::hydrate) runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            readiness: Readiness::pending(),
        }
    }

    /// A gateway that never touches disk. Readiness is set immediately.
    pub fn disabled() -> Self {
        Self {
            path: None,
            readiness: Readiness::ready(),
        }
    }

    /// `.localstore/db.json` under the current working directory.
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_default()
            .join(DEFAULT_SNAPSHOT_DIR)
            .join(DEFAULT_SNAPSHOT_FILE)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The readiness signal completed by [`hydrate`](Self::hydrate).
    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    /// Loads the snapshot into `backend`, then marks the gateway ready.
    ///
    /// Returns `true` when a snapshot was restored. Every failure is logged and
    /// leaves the backend untouched.
    pub async fn hydrate<B: StoreBackend>(&self, backend: &B) -> bool {
        let loaded = match &self.path {
            Some(path) => Self::hydrate_from(path, backend).await,
            None => false,
        };

        self.readiness.mark_ready();
        loaded
    }

    async fn hydrate_from<B: StoreBackend>(path: &Path, backend: &B) -> bool {
        let snapshot = match load_snapshot(path).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::info!(path = %path.display(), "no snapshot to load, starting empty");
                return false;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load snapshot, starting empty");
                return false;
            }
        };

        let documents: usize = snapshot.values().map(|c| c.len()).sum();
        let collections = snapshot.len();

        match backend.restore(snapshot).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), collections, documents, "loaded snapshot");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to restore snapshot");
                false
            }
        }
    }

    /// Writes the whole of `backend` to the snapshot file, replacing prior content.
    ///
    /// Returns `true` on success. Failures are logged and swallowed. Nothing is
    /// written when hydration was abandoned, since the backend never saw the
    /// snapshot it would replace.
    pub async fn flush<B: StoreBackend>(&self, backend: &B) -> bool {
        let Some(path) = &self.path else {
            return false;
        };

        if self.readiness.is_abandoned() {
            tracing::warn!(path = %path.display(), "hydration never completed, keeping existing snapshot");
            return false;
        }

        let result = match backend.snapshot().await {
            Ok(snapshot) => write_snapshot(path, &snapshot),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!(path = %path.display(), "flushed snapshot");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "persisting snapshot failed");
                false
            }
        }
    }
}

/// Reads and validates a snapshot file. A missing file yields `Ok(None)`.
///
/// # Errors
///
/// [`DocumentStoreError::Persistence`] on I/O failure,
/// [`DocumentStoreError::Serialization`] when the file is not a valid snapshot.
pub fn read_snapshot(path: &Path) -> DocumentStoreResult<Option<StoreMap>> {
    match fs::read(path) {
        Ok(raw) => decode_snapshot(&raw).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// [`read_snapshot`] without blocking the runtime. Must run inside a tokio runtime.
pub async fn load_snapshot(path: &Path) -> DocumentStoreResult<Option<StoreMap>> {
    match tokio::fs::read(path).await {
        Ok(raw) => decode_snapshot(&raw).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn decode_snapshot(raw: &[u8]) -> DocumentStoreResult<StoreMap> {
    let snapshot: StoreMap = serde_json::from_slice(raw)?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

/// Serializes `snapshot` to `path` through a temp file + rename, creating the parent directory.
///
/// # Errors
///
/// [`DocumentStoreError::Persistence`] on I/O failure.
pub fn write_snapshot(path: &Path, snapshot: &StoreMap) -> DocumentStoreResult<()> {
    let bytes = serde_json::to_vec(snapshot)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, &bytes)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Checks that every document sits under its own guid and type, and that no
/// guid appears under more than one type.
pub fn validate_snapshot(snapshot: &StoreMap) -> DocumentStoreResult<()> {
    let mut seen = HashSet::new();

    for (type_name, collection) in snapshot {
        for (guid, doc) in collection {
            if &doc.guid != guid || &doc.type_name != type_name {
                return Err(DocumentStoreError::Serialization(format!(
                    "snapshot entry {type_name}/{guid} holds document {}/{}",
                    doc.type_name, doc.guid
                )));
            }
            if !seen.insert(guid.as_str()) {
                return Err(DocumentStoreError::Serialization(format!(
                    "snapshot guid {guid} appears under more than one type"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CollectionMap, Document, Fields};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    /// A backend that holds nothing.
    #[derive(Debug)]
    struct EmptyBackend;

    #[async_trait]
    impl StoreBackend for EmptyBackend {
        async fn insert_documents(&self, _type_name: &str, _fields: Vec<Fields>) -> DocumentStoreResult<Vec<Document>> {
            Ok(vec![])
        }

        async fn get_document(&self, type_name: &str, _guid: &str) -> DocumentStoreResult<Option<Document>> {
            Err(DocumentStoreError::UnknownType(type_name.to_string()))
        }

        async fn replace_fields(&self, type_name: &str, guid: &str, _fields: Fields) -> DocumentStoreResult<Document> {
            Err(DocumentStoreError::NotFound(guid.to_string(), type_name.to_string()))
        }

        async fn remove_document(&self, _type_name: &str, _guid: &str) -> DocumentStoreResult<Option<Document>> {
            Ok(None)
        }

        async fn list_documents(&self, type_name: &str) -> DocumentStoreResult<Vec<Document>> {
            Err(DocumentStoreError::UnknownType(type_name.to_string()))
        }

        async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
            Ok(vec![])
        }

        async fn snapshot(&self) -> DocumentStoreResult<StoreMap> {
            Ok(StoreMap::new())
        }

        async fn restore(&self, _snapshot: StoreMap) -> DocumentStoreResult<()> {
            Ok(())
        }
    }

    fn sample() -> StoreMap {
        let fields = json!({ "name": "Alice" }).as_object().cloned().unwrap();
        let doc = Document::new("0123456789abcdef01234567", "users", fields);

        let mut users = CollectionMap::new();
        users.insert(doc.guid.clone(), doc);

        let mut snapshot = StoreMap::new();
        snapshot.insert("users".to_string(), users);
        snapshot
    }

    #[test]
    fn missing_snapshot_reads_as_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_snapshot(&dir.path().join("db.json")).unwrap(), None);
    }

    #[test]
    fn write_then_read_restores_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".hidden").join("db.json");

        write_snapshot(&path, &sample()).unwrap();

        assert_eq!(read_snapshot(&path).unwrap(), Some(sample()));
        assert!(!dir.path().join(".hidden").join("db.json.tmp").exists());
    }

    #[test]
    fn snapshot_file_uses_nested_type_guid_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        write_snapshot(&path, &sample()).unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({
                "users": {
                    "0123456789abcdef01234567": {
                        "guid": "0123456789abcdef01234567",
                        "type": "users",
                        "fields": { "name": "Alice" },
                    }
                }
            })
        );
    }

    #[test]
    fn garbage_snapshot_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(
            read_snapshot(&path),
            Err(DocumentStoreError::Serialization(_))
        ));
    }

    #[test]
    fn misplaced_document_fails_validation() {
        let mut snapshot = sample();
        let users = snapshot.remove("users").unwrap();
        snapshot.insert("admins".to_string(), users);

        assert!(validate_snapshot(&snapshot).is_err());
    }

    #[test]
    fn guid_shared_across_types_fails_validation() {
        let mut snapshot = sample();
        let doc = snapshot["users"]["0123456789abcdef01234567"].clone();
        let admin = Document::new(doc.guid.clone(), "admins", doc.fields);

        let mut admins = CollectionMap::new();
        admins.insert(admin.guid.clone(), admin);
        snapshot.insert("admins".to_string(), admins);

        assert!(matches!(
            validate_snapshot(&snapshot),
            Err(DocumentStoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn load_snapshot_matches_read_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");

        assert_eq!(load_snapshot(&path).await.unwrap(), None);

        write_snapshot(&path, &sample()).unwrap();
        assert_eq!(load_snapshot(&path).await.unwrap(), Some(sample()));
    }

    #[test]
    fn dropped_guard_fires_readiness() {
        let readiness = Readiness::pending();
        let guard = readiness.guard();
        assert!(!readiness.is_ready());

        drop(guard);
        assert!(readiness.is_ready());
        assert!(readiness.is_abandoned());

        let completed = Readiness::pending();
        let guard = completed.guard();
        completed.mark_ready();
        drop(guard);
        assert!(!completed.is_abandoned());
    }

    #[tokio::test]
    async fn abandoned_hydration_never_overwrites_the_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        write_snapshot(&path, &sample()).unwrap();

        let gateway = SnapshotGateway::new(path.clone());
        drop(gateway.readiness().guard());

        let empty = EmptyBackend;
        assert!(!gateway.flush(&empty).await);
        assert_eq!(read_snapshot(&path).unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn readiness_wakes_waiters() {
        let readiness = Readiness::pending();
        assert!(!readiness.is_ready());

        let waiter = {
            let readiness = readiness.clone();
            tokio::spawn(async move { readiness.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        readiness.mark_ready();
        readiness.mark_ready();
        waiter.await.unwrap();
        assert!(readiness.is_ready());
    }

    #[test]
    fn disabled_gateway_is_ready_without_path() {
        let gateway = SnapshotGateway::disabled();
        assert!(gateway.readiness().is_ready());
        assert!(gateway.path().is_none());
    }
}
