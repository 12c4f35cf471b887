//! Local index store for the Symfony project model.
//!
//! Provides the SQLite connection pool (via `r2d2`), schema bootstrap and
//! repair, and the five data-access objects the indexer and the editor
//! features query.
//!
//! # Design decisions
//!
//! - **Derived data only**: everything in the index can be regenerated from
//!   project sources, so an unusable database is discarded and rebuilt
//!   rather than migrated. [`RecoveryPolicy`] controls whether the old file
//!   is deleted, kept as a backup, or left alone.
//! - **No global instance**: the host owns a [`SharedIndex`] and passes it
//!   around; the store opens lazily on first use.
//! - **Stateless DAOs**: DAO methods take the connection they run on, so
//!   callers control transaction boundaries.

mod error;
mod files;
mod pool;
mod preferences;
mod schema;
mod shared;
mod store;

pub mod dao;

pub use dao::{IndexDao, ParameterDao, ResourceDao, RouteDao, ServiceDao, TransUnitDao};
pub use error::{Result, StoreError};
pub use files::DatabaseFiles;
pub use pool::{ConnectionSpec, DbConnection, DbPool, DB_NAME};
pub use preferences::{CacheType, IndexPreferences, LockMode, RecoveryPolicy};
pub use schema::{Schema, SchemaState, SCHEMA_VERSION, TABLES};
pub use shared::SharedIndex;
pub use store::{IndexStore, IndexSummary, OpenReport, SchemaAction};
