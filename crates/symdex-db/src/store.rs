//! The index store: opens the database, repairs it if needed, and hands out
//! pooled connections and DAOs.

use std::fmt;
use std::path::Path;
use std::sync::RwLock;

use serde::Serialize;

use crate::dao::{IndexDao, ParameterDao, ResourceDao, RouteDao, ServiceDao, TransUnitDao};
use crate::error::{Result, StoreError};
use crate::files::DatabaseFiles;
use crate::pool::{ConnectionSpec, DbConnection, DbPool};
use crate::preferences::{IndexPreferences, RecoveryPolicy};
use crate::schema::{Schema, SchemaState, SCHEMA_VERSION};

/// What happened to the schema while opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaAction {
    /// An existing compatible database was kept.
    Reused,
    /// The database was empty and got a fresh schema.
    Initialized,
    /// An incompatible database was discarded and recreated.
    Rebuilt,
}

/// Outcome of [`IndexStore::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpenReport {
    /// Attempts needed, starting at 1.
    pub attempts: u32,
    /// What was done to the schema on the successful attempt.
    pub schema: SchemaAction,
}

/// Schema version plus row counts per index table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    /// Value of `PRAGMA user_version`.
    pub schema_version: i64,
    /// Rows in `services`.
    pub services: i64,
    /// Rows in `parameters`.
    pub parameters: i64,
    /// Rows in `routes`.
    pub routes: i64,
    /// Rows in `resources`.
    pub resources: i64,
    /// Rows in `trans_units`.
    pub trans_units: i64,
}

/// An open index database.
///
/// Owns the connection pool and the five DAO handles. Share it through an
/// `Arc`; [`IndexStore::dispose`] works through a shared reference.
pub struct IndexStore {
    pool: RwLock<Option<DbPool>>,
    spec: ConnectionSpec,
    report: OpenReport,
    service_dao: ServiceDao,
    parameter_dao: ParameterDao,
    route_dao: RouteDao,
    resource_dao: ResourceDao,
    trans_unit_dao: TransUnitDao,
}

impl IndexStore {
    /// Opens (creating if necessary) the index database under `state_dir`.
    ///
    /// Each attempt opens a probe connection, checks the schema, discards
    /// the database files if the schema is unusable, builds the pool and
    /// initializes the schema when needed. A database or pool failure
    /// discards the files and retries, up to `max_open_attempts` times.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` if the state directory cannot be created or the
    ///   database files cannot be discarded.
    /// - `StoreError::IncompatibleSchema` under [`RecoveryPolicy::Fail`].
    /// - `StoreError::OpenExhausted` once every attempt failed.
    pub fn open(state_dir: &Path, prefs: &IndexPreferences) -> Result<Self> {
        std::fs::create_dir_all(state_dir).map_err(|e| StoreError::io(state_dir, e))?;

        let spec = ConnectionSpec::new(state_dir, prefs);
        let files = DatabaseFiles::new(spec.db_path());
        let max_attempts = prefs.max_open_attempts.max(1);

        tracing::debug!(
            connection = spec.connection_string(),
            max_attempts,
            "opening index store"
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            match try_open(&spec, &files, prefs.recovery) {
                Ok((pool, schema)) => {
                    let report = OpenReport {
                        attempts: attempt,
                        schema,
                    };
                    tracing::info!(
                        path = %spec.db_path().display(),
                        attempts = attempt,
                        schema = ?schema,
                        pool_max_size = pool.max_size(),
                        "index store opened"
                    );
                    return Ok(Self::from_parts(pool, spec, report));
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "failed to open index database");
                    if !files.discard(prefs.recovery)? {
                        return Err(e);
                    }
                    if attempt >= max_attempts {
                        return Err(StoreError::OpenExhausted {
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn from_parts(pool: DbPool, spec: ConnectionSpec, report: OpenReport) -> Self {
        Self {
            pool: RwLock::new(Some(pool)),
            spec,
            report,
            service_dao: ServiceDao,
            parameter_dao: ParameterDao,
            route_dao: RouteDao,
            resource_dao: ResourceDao,
            trans_unit_dao: TransUnitDao,
        }
    }

    /// Checks out a pooled connection.
    ///
    /// # Errors
    ///
    /// `StoreError::Disposed` after [`dispose`](Self::dispose), or
    /// `StoreError::Pool` if no connection frees up within the timeout.
    pub fn connection(&self) -> Result<DbConnection> {
        let pool = {
            let guard = self.pool.read().unwrap_or_else(|e| e.into_inner());
            guard.as_ref().cloned().ok_or(StoreError::Disposed)?
        };
        Ok(pool.get()?)
    }

    /// Releases the pool. Connections already checked out stay usable until
    /// dropped. Calling this more than once is harmless.
    pub fn dispose(&self) {
        let pool = self
            .pool
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if pool.is_some() {
            tracing::info!(path = %self.spec.db_path().display(), "index store disposed");
        }
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.pool
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    /// How the store got opened.
    pub fn open_report(&self) -> OpenReport {
        self.report
    }

    /// The connection string the pool was built from.
    pub fn connection_string(&self) -> &str {
        self.spec.connection_string()
    }

    /// Path of the main database file.
    pub fn db_path(&self) -> &Path {
        self.spec.db_path()
    }

    /// Service definitions.
    pub fn services(&self) -> &ServiceDao {
        &self.service_dao
    }

    /// Container parameters.
    pub fn parameters(&self) -> &ParameterDao {
        &self.parameter_dao
    }

    /// Route definitions.
    pub fn routes(&self) -> &RouteDao {
        &self.route_dao
    }

    /// Imported resources.
    pub fn resources(&self) -> &ResourceDao {
        &self.resource_dao
    }

    /// Translation units.
    pub fn trans_units(&self) -> &TransUnitDao {
        &self.trans_unit_dao
    }

    /// Removes everything indexed from the project file `path`, across all
    /// tables, in one transaction. Returns the number of rows removed.
    pub fn purge_path(&self, path: &str) -> Result<usize> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        let removed = self.service_dao.delete_by_path(&tx, path)?
            + self.parameter_dao.delete_by_path(&tx, path)?
            + self.route_dao.delete_by_path(&tx, path)?
            + self.resource_dao.delete_by_path(&tx, path)?
            + self.trans_unit_dao.delete_by_path(&tx, path)?;

        tx.commit()?;
        tracing::debug!(path, removed, "purged indexed file");
        Ok(removed)
    }

    /// Schema version and row counts of every table.
    pub fn summary(&self) -> Result<IndexSummary> {
        let conn = self.connection()?;
        Ok(IndexSummary {
            schema_version: Schema.version(&conn)?,
            services: self.service_dao.count(&conn)?,
            parameters: self.parameter_dao.count(&conn)?,
            routes: self.route_dao.count(&conn)?,
            resources: self.resource_dao.count(&conn)?,
            trans_units: self.trans_unit_dao.count(&conn)?,
        })
    }
}

impl fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexStore")
            .field("connection", &self.spec.connection_string())
            .field("report", &self.report)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// One open attempt. Every connection opened here is closed before return,
/// on success and on error alike.
fn try_open(
    spec: &ConnectionSpec,
    files: &DatabaseFiles,
    recovery: RecoveryPolicy,
) -> Result<(DbPool, SchemaAction)> {
    let state = {
        let probe = spec.open_connection()?;
        Schema.inspect(&probe)?
    };

    let action = match state {
        SchemaState::Compatible => SchemaAction::Reused,
        SchemaState::Empty => SchemaAction::Initialized,
        SchemaState::Incompatible { found } => {
            tracing::warn!(
                found,
                expected = SCHEMA_VERSION,
                "index schema is incompatible"
            );
            if !files.discard(recovery)? {
                return Err(StoreError::IncompatibleSchema {
                    found,
                    expected: SCHEMA_VERSION,
                });
            }
            SchemaAction::Rebuilt
        }
    };

    let pool = spec.create_pool()?;
    if action != SchemaAction::Reused {
        let conn = pool.get()?;
        Schema.initialize(&conn)?;
    }

    Ok((pool, action))
}
