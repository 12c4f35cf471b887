//! Connection string building and pool creation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};

use crate::preferences::{IndexPreferences, LockMode};

/// Logical name of the index database inside the state directory.
pub const DB_NAME: &str = "symfonymodel";

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of a [`DbPool`]. Returned to the pool on drop.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Everything needed to open a connection to the index database.
#[derive(Debug, Clone)]
pub struct ConnectionSpec {
    db_path: PathBuf,
    uri: String,
    prefs: IndexPreferences,
}

impl ConnectionSpec {
    /// Builds the connection settings for the index database under `state_dir`.
    pub fn new(state_dir: &Path, prefs: &IndexPreferences) -> Self {
        let db_path = state_dir.join(format!("{DB_NAME}.db"));
        let uri = format!(
            "file:{}?mode=rwc&cache={}",
            encode_uri_path(&db_path),
            prefs.cache_type.as_uri_param()
        );
        Self {
            db_path,
            uri,
            prefs: prefs.clone(),
        }
    }

    /// Path of the main database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// The SQLite URI used to open connections.
    pub fn connection_string(&self) -> &str {
        &self.uri
    }

    fn flags() -> OpenFlags {
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX
    }

    /// Opens a standalone connection with every pragma applied.
    ///
    /// Fails fast on a file that is not a database, which the pool would
    /// otherwise only report after its connection timeout.
    pub fn open_connection(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open_with_flags(&self.uri, Self::flags())?;
        configure(&conn, &self.prefs)?;
        Ok(conn)
    }

    /// Creates a connection pool sized and tuned from the preferences.
    ///
    /// # Errors
    ///
    /// Returns `r2d2::Error` if the pool cannot establish its idle connections.
    pub fn create_pool(&self) -> Result<DbPool, r2d2::Error> {
        let prefs = self.prefs.clone();
        let manager = SqliteConnectionManager::file(&self.uri)
            .with_flags(Self::flags())
            .with_init(move |conn| configure(conn, &prefs));

        Pool::builder()
            .max_size(self.prefs.pool_max_size.max(1))
            .min_idle(Some(self.prefs.pool_min_idle.min(self.prefs.pool_max_size)))
            .connection_timeout(Duration::from_millis(self.prefs.connection_timeout_ms.max(1)))
            .build(manager)
    }
}

/// Applies the per-connection pragmas derived from the preferences.
fn configure(conn: &Connection, prefs: &IndexPreferences) -> rusqlite::Result<()> {
    let requested = prefs.lock_mode.journal_mode();
    let journal_mode: String = conn.query_row(
        &format!("PRAGMA journal_mode = {requested};"),
        [],
        |row| row.get(0),
    )?;
    // In-memory databases report "memory" whatever was asked for.
    if !journal_mode.eq_ignore_ascii_case(requested) && journal_mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!(
                "failed to set {requested} journal mode, got: {journal_mode}"
            )),
        ));
    }

    let cache_spill = match prefs.large_result_buffer_size {
        0 => "OFF".to_string(),
        pages => pages.to_string(),
    };
    conn.execute_batch(&format!(
        "PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {};
         PRAGMA cache_size = -{};
         PRAGMA cache_spill = {};
         PRAGMA read_uncommitted = {};",
        prefs.busy_timeout_ms,
        prefs.cache_size_kib,
        cache_spill,
        u8::from(prefs.lock_mode == LockMode::None),
    ))?;

    conn.set_prepared_statement_cache_capacity(prefs.query_cache_size);
    Ok(())
}

/// Escapes the characters that carry meaning inside an SQLite URI path.
fn encode_uri_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3f"),
            '#' => out.push_str("%23"),
            _ => out.push(c),
        }
    }
    out
}
