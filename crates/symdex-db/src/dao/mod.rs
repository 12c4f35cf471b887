//! Data-access objects, one per index table.
//!
//! DAOs hold no state. Every method takes the connection it runs on, so the
//! caller decides whether a batch of calls shares one transaction.

mod parameter;
mod resource;
mod route;
mod service;
mod trans_unit;

pub use parameter::ParameterDao;
pub use resource::ResourceDao;
pub use route::RouteDao;
pub use service::ServiceDao;
pub use trans_unit::TransUnitDao;

use rusqlite::Connection;

use crate::error::Result;

/// Operations shared by every index table.
pub trait IndexDao {
    /// Name of the backing table.
    const TABLE: &'static str;

    /// Number of rows in the table.
    fn count(&self, conn: &Connection) -> Result<i64> {
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", Self::TABLE), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// Removes every row indexed from the project file `path`.
    fn delete_by_path(&self, conn: &Connection, path: &str) -> Result<usize> {
        let mut stmt = conn.prepare_cached(&format!("DELETE FROM {} WHERE path = ?1", Self::TABLE))?;
        Ok(stmt.execute([path])?)
    }
}

/// Collects the rows of a mapped query into a `Vec`.
fn collect_rows<T>(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
