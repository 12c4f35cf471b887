//! Index schema: compatibility checks and initialization.
//!
//! The schema is created in one shot from embedded DDL and stamped with
//! [`SCHEMA_VERSION`] in `PRAGMA user_version`. There is no migration path:
//! the index is derived data, so a database written by another version is
//! discarded and rebuilt by the store.

use rusqlite::Connection;

/// Schema version this build reads and writes.
pub const SCHEMA_VERSION: i64 = 1;

/// Tables every compatible index database has.
pub const TABLES: &[&str] = &[
    "services",
    "parameters",
    "routes",
    "resources",
    "trans_units",
];

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

/// No-op query whose failure means the base table is missing or unreadable.
const PROBE_SQL: &str = "SELECT COUNT(*) FROM services WHERE 1=0";

/// What [`Schema::inspect`] found in a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// The database has no tables at all.
    Empty,
    /// Every expected table exists and the version matches.
    Compatible,
    /// The probe failed or the version differs.
    Incompatible {
        /// The version stamped in the database.
        found: i64,
    },
}

/// The expected index table layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Schema;

impl Schema {
    /// Classifies the schema of the database behind `conn`.
    ///
    /// # Errors
    ///
    /// Returns an error only if SQLite metadata itself cannot be read, which
    /// usually means the file is not a database.
    pub fn inspect(&self, conn: &Connection) -> rusqlite::Result<SchemaState> {
        let found: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )?;

        if table_count == 0 && found == 0 {
            return Ok(SchemaState::Empty);
        }

        if let Err(e) = conn.query_row(PROBE_SQL, [], |row| row.get::<_, i64>(0)) {
            tracing::debug!(error = %e, "schema probe failed");
            return Ok(SchemaState::Incompatible { found });
        }

        if self.is_compatible(conn)? {
            Ok(SchemaState::Compatible)
        } else {
            Ok(SchemaState::Incompatible { found })
        }
    }

    /// Returns whether the version matches and all expected tables exist.
    pub fn is_compatible(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version != SCHEMA_VERSION {
            return Ok(false);
        }

        for table in TABLES {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [table],
                |row| row.get(0),
            )?;
            if !exists {
                tracing::debug!(table, "expected table missing");
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Creates all tables and stamps the schema version.
    ///
    /// Runs in a single transaction, so a failure leaves no partial schema.
    pub fn initialize(&self, conn: &Connection) -> rusqlite::Result<()> {
        tracing::info!(version = SCHEMA_VERSION, "initializing index schema");

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(SCHEMA_SQL)?;
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()
    }

    /// Reads the version stamped in the database.
    pub fn version(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
    }
}
