//! Tunables that shape how the index database is opened.
//!
//! Every field has a default so a host can deserialize a partial `[index]`
//! table and get a working store.

use serde::Deserialize;

/// How concurrent readers and writers see each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// Readers may observe uncommitted writes (only effective with a shared cache).
    None,
    /// Rollback journal: a writer locks the whole database.
    Table,
    /// Write-ahead log: readers see the last committed snapshot.
    #[default]
    ReadCommitted,
}

impl LockMode {
    /// The `journal_mode` pragma value used for this lock mode.
    pub fn journal_mode(self) -> &'static str {
        match self {
            Self::Table => "delete",
            Self::None | Self::ReadCommitted => "wal",
        }
    }
}

/// Page cache sharing between connections of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// Each connection keeps its own page cache.
    #[default]
    Private,
    /// Connections share one page cache.
    Shared,
}

impl CacheType {
    /// The value of the `cache` URI parameter.
    pub fn as_uri_param(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Shared => "shared",
        }
    }
}

/// What to do with an existing database that cannot be used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Delete the database files and start over.
    #[default]
    Rebuild,
    /// Rename the database files to a timestamped backup and start over.
    Preserve,
    /// Leave the files alone and report the error.
    Fail,
}

/// Index store preferences.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexPreferences {
    /// Locking behaviour between connections.
    pub lock_mode: LockMode,
    /// Page cache sharing.
    pub cache_type: CacheType,
    /// Page cache size per connection, in KiB.
    pub cache_size_kib: u32,
    /// Prepared statements cached per connection.
    pub query_cache_size: usize,
    /// Dirty pages held in memory before spilling to the database file.
    /// Zero disables spilling.
    pub large_result_buffer_size: u32,
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Maximum number of pooled connections.
    pub pool_max_size: u32,
    /// Connections the pool keeps open while idle.
    pub pool_min_idle: u32,
    /// How long a checkout waits for a free connection, in milliseconds.
    pub connection_timeout_ms: u64,
    /// How many times opening is attempted before giving up.
    pub max_open_attempts: u32,
    /// Handling of unusable existing databases.
    pub recovery: RecoveryPolicy,
}

impl Default for IndexPreferences {
    fn default() -> Self {
        Self {
            lock_mode: LockMode::default(),
            cache_type: CacheType::default(),
            cache_size_kib: 8_192,
            query_cache_size: 64,
            large_result_buffer_size: 10_000,
            busy_timeout_ms: 5_000,
            pool_max_size: 100,
            pool_min_idle: 1,
            connection_timeout_ms: 5_000,
            max_open_attempts: 2,
            recovery: RecoveryPolicy::default(),
        }
    }
}
