//! Expiring key-value cache.
//!
//! Values are stored as strings with an expiry deadline. Expiry is checked on
//! access, so an expired entry behaves exactly like one that was never saved.
//! Expired entries are reclaimed when touched, by [`ExpiringCache::purge_expired`],
//! or periodically once [`ExpiringCache::spawn_purger`] has been started.

use chrono::{DateTime, TimeDelta, Utc};
use mea::rwlock::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::task::JoinHandle;

use localstore_core::config::CACHE_DEFAULT_TTL_SECS;

use crate::error::{CacheError, CacheResult};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A cache request in the action-based shape.
///
/// `expire` is in seconds; absent or zero means the 24-hour default.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CacheRequest {
    #[serde(default, alias = "action", skip_serializing_if = "Option::is_none")]
    pub act: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<u64>,
}

impl CacheRequest {
    pub fn save(key: impl Into<String>, value: impl Into<Value>, expire: Option<u64>) -> Self {
        Self {
            act: Some("save".to_string()),
            key: Some(key.into()),
            value: Some(value.into()),
            expire,
        }
    }

    pub fn load(key: impl Into<String>) -> Self {
        Self {
            act: Some("load".to_string()),
            key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            act: Some("remove".to_string()),
            key: Some(key.into()),
            ..Default::default()
        }
    }

    fn require_key(&self) -> CacheResult<&str> {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(CacheError::MissingArgument("key")),
        }
    }
}

/// Result of a dispatched cache request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResponse {
    /// `save` always answers `"OK"`.
    Saved,
    /// `load` answers the stored string, or nothing.
    Loaded(Option<String>),
    /// `remove` answers 1 if a live entry was removed, else 0.
    Removed(u8),
}

impl CacheResponse {
    /// The JSON value the hosted API would return.
    pub fn to_json(&self) -> Value {
        match self {
            CacheResponse::Saved => Value::from("OK"),
            CacheResponse::Loaded(value) => value
                .clone()
                .map(Value::from)
                .unwrap_or(Value::Null),
            CacheResponse::Removed(n) => Value::from(*n),
        }
    }
}

/// Thread-safe string cache with per-entry expiry.
///
/// Clones share the same entries.
///
/// # Example
///
/// ```ignore
/// use localstore_cache::ExpiringCache;
///
/// let cache = ExpiringCache::new();
/// cache.save("greeting", "hello", Some(60)).await;
/// assert_eq!(cache.load("greeting").await.as_deref(), Some("hello"));
/// ```
#[derive(Clone, Debug)]
pub struct ExpiringCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    default_ttl: TimeDelta,
}

impl ExpiringCache {
    /// Creates an empty cache with the 24-hour default lifetime.
    pub fn new() -> Self {
        Self::with_default_ttl(TimeDelta::seconds(CACHE_DEFAULT_TTL_SECS as i64))
    }

    /// Creates an empty cache whose entries live `ttl` unless saved with an explicit expiry.
    pub fn with_default_ttl(ttl: TimeDelta) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: ttl,
        }
    }

    /// Stores the string form of `value` under `key` for `expire` seconds.
    ///
    /// A JSON string is stored as-is; any other value is stored as its JSON text.
    pub async fn save(&self, key: &str, value: impl Into<Value>, expire: Option<u64>) -> CacheResponse {
        let ttl = expire
            .filter(|secs| *secs > 0)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(self.default_ttl);

        self.save_for(key, value, ttl).await
    }

    /// Stores the string form of `value` under `key` for exactly `ttl`.
    pub async fn save_for(&self, key: &str, value: impl Into<Value>, ttl: TimeDelta) -> CacheResponse {
        let value = match value.into() {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry { value, expires_at });

        tracing::debug!(key, %expires_at, "cache entry saved");

        CacheResponse::Saved
    }

    /// The live value under `key`, if any. Drops the entry if it has expired.
    pub async fn load(&self, key: &str) -> Option<String> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        entries.remove(key);
        tracing::debug!(key, "cache entry expired");

        None
    }

    /// Removes `key`, returning 1 if a live entry existed and 0 otherwise.
    pub async fn remove(&self, key: &str) -> u8 {
        let now = Utc::now();

        match self.entries.write().await.remove(key) {
            Some(entry) if entry.is_live(now) => 1,
            _ => 0,
        }
    }

    /// Drops every expired entry and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        purge(&self.entries).await
    }

    /// Spawns a task on the current tokio runtime that purges expired entries every `every`.
    ///
    /// The task only holds a weak reference and ends once every clone of the cache
    /// has been dropped.
    ///
    /// # Errors
    ///
    /// [`CacheError::Runtime`] when called outside a tokio runtime.
    pub fn spawn_purger(&self, every: Duration) -> CacheResult<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CacheError::Runtime(e.to_string()))?;

        let entries = Arc::downgrade(&self.entries);
        let every = every.max(Duration::from_millis(1));

        Ok(runtime.spawn(async move {
            let mut interval = tokio::time::interval(every);

            loop {
                interval.tick().await;

                let Some(entries) = entries.upgrade() else {
                    break;
                };
                let purged = purge(&entries).await;
                if purged > 0 {
                    tracing::debug!(purged, "purged expired cache entries");
                }
            }
        }))
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Routes a request by its `act` selector.
    ///
    /// # Errors
    ///
    /// [`CacheError::MissingAction`] / [`CacheError::UnknownAction`] for a bad selector,
    /// [`CacheError::MissingArgument`] when `key` (or `value` for save) is absent.
    pub async fn dispatch(&self, request: CacheRequest) -> CacheResult<CacheResponse> {
        let act = match request.act.as_deref() {
            None | Some("") => return Err(CacheError::MissingAction),
            Some(act) => act,
        };

        match act {
            "save" => {
                let key = request.require_key()?;
                let value = match &request.value {
                    None | Some(Value::Null) => return Err(CacheError::MissingArgument("value")),
                    Some(value) => value.clone(),
                };

                Ok(self.save(key, value, request.expire).await)
            }
            "load" => Ok(CacheResponse::Loaded(self.load(request.require_key()?).await)),
            "remove" => Ok(CacheResponse::Removed(self.remove(request.require_key()?).await)),
            other => Err(CacheError::UnknownAction(other.to_string())),
        }
    }
}

async fn purge(entries: &RwLock<HashMap<String, CacheEntry>>) -> usize {
    let now = Utc::now();
    let mut entries = entries.write().await;
    let before = entries.len();

    entries.retain(|_, entry| entry.is_live(now));

    before - entries.len()
}

impl Default for ExpiringCache {
    fn default() -> Self {
        Self::new()
    }
}
