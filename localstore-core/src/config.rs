//! Configuration constants for localstore.
//!
//! These are compile-time defaults; runtime options are set through the store and
//! handle builders, plus the [`SNAPSHOT_PATH_ENV`] override.

/// Hidden directory, relative to the working directory, that holds the snapshot.
pub const DEFAULT_SNAPSHOT_DIR: &str = ".localstore";

/// File name of the snapshot inside [`DEFAULT_SNAPSHOT_DIR`].
pub const DEFAULT_SNAPSHOT_FILE: &str = "db.json";

/// Environment variable overriding the snapshot path. An empty value disables persistence.
pub const SNAPSHOT_PATH_ENV: &str = "LOCALSTORE_SNAPSHOT_PATH";

/// Number of 4-character hex groups in a guid.
pub const GUID_GROUPS: usize = 6;

/// Width in characters of one guid group.
pub const GUID_GROUP_WIDTH: usize = 4;

/// Total guid length.
pub const GUID_LEN: usize = GUID_GROUPS * GUID_GROUP_WIDTH;

/// Lifetime of a cache entry saved without an explicit expiry (24 hours).
pub const CACHE_DEFAULT_TTL_SECS: u64 = 86_400;
