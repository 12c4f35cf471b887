//! Service definitions.

use rusqlite::{params, Connection, OptionalExtension, Row};
use symdex_types::Service;

use super::{collect_rows, IndexDao};
use crate::error::Result;

const COLUMNS: &str = "service_id, class_name, public, tags_json, path";

/// Access to the `services` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceDao;

impl IndexDao for ServiceDao {
    const TABLE: &'static str = "services";
}

impl ServiceDao {
    /// Stores a service, replacing any definition with the same id from the same file.
    ///
    /// A replaced row gets a new rowid, so the latest insert is the most
    /// recently indexed definition.
    pub fn insert(&self, conn: &Connection, service: &Service) -> Result<()> {
        let tags_json = serde_json::to_string(&service.tags)?;
        let mut stmt = conn.prepare_cached(
            "INSERT OR REPLACE INTO services (service_id, class_name, public, tags_json, path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(params![
            service.id,
            service.class_name,
            service.public,
            tags_json,
            service.path,
        ])?;
        Ok(())
    }

    /// Looks up a service by id. If several files define it, the most recently
    /// indexed definition wins.
    pub fn find_by_id(&self, conn: &Connection, id: &str) -> Result<Option<Service>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {COLUMNS} FROM services WHERE service_id = ?1 ORDER BY id DESC LIMIT 1"
        ))?;
        Ok(stmt.query_row([id], map_row).optional()?)
    }

    /// All services implemented by `class_name`.
    pub fn find_by_class(&self, conn: &Connection, class_name: &str) -> Result<Vec<Service>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {COLUMNS} FROM services WHERE class_name = ?1 ORDER BY service_id ASC"
        ))?;
        let rows = stmt.query_map([class_name], map_row)?;
        collect_rows(rows)
    }

    /// All services carrying `tag`.
    pub fn find_by_tag(&self, conn: &Connection, tag: &str) -> Result<Vec<Service>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {COLUMNS} FROM services
             WHERE EXISTS (SELECT 1 FROM json_each(services.tags_json) WHERE json_each.value = ?1)
             ORDER BY service_id ASC"
        ))?;
        let rows = stmt.query_map([tag], map_row)?;
        collect_rows(rows)
    }

    /// Every indexed service, ordered by id.
    pub fn find_all(&self, conn: &Connection) -> Result<Vec<Service>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {COLUMNS} FROM services ORDER BY service_id ASC, path ASC"
        ))?;
        let rows = stmt.query_map([], map_row)?;
        collect_rows(rows)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    let tags_json: String = row.get(3)?;
    let tags = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Service {
        id: row.get(0)?,
        class_name: row.get(1)?,
        public: row.get(2)?,
        tags,
        path: row.get(4)?,
    })
}
