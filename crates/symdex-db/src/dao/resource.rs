//! Imported resources.

use rusqlite::{params, Connection, Row};
use symdex_types::{Resource, ResourceKind};

use super::{collect_rows, IndexDao};
use crate::error::Result;

/// Access to the `resources` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceDao;

impl IndexDao for ResourceDao {
    const TABLE: &'static str = "resources";
}

impl ResourceDao {
    /// Stores an import, replacing the same import declared by the same file.
    pub fn insert(&self, conn: &Connection, resource: &Resource) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO resources (resource, kind, prefix, path) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (resource, path) DO UPDATE SET
                kind = excluded.kind,
                prefix = excluded.prefix",
        )?;
        stmt.execute(params![
            resource.resource,
            resource.kind.as_str(),
            resource.prefix,
            resource.path,
        ])?;
        Ok(())
    }

    /// Imports of one kind.
    pub fn find_by_kind(&self, conn: &Connection, kind: ResourceKind) -> Result<Vec<Resource>> {
        let mut stmt = conn.prepare_cached(
            "SELECT resource, kind, prefix, path FROM resources
             WHERE kind = ?1 ORDER BY resource ASC",
        )?;
        let rows = stmt.query_map([kind.as_str()], map_row)?;
        collect_rows(rows)
    }

    /// Every indexed import.
    pub fn find_all(&self, conn: &Connection) -> Result<Vec<Resource>> {
        let mut stmt = conn.prepare_cached(
            "SELECT resource, kind, prefix, path FROM resources ORDER BY resource ASC, path ASC",
        )?;
        let rows = stmt.query_map([], map_row)?;
        collect_rows(rows)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    let kind: String = row.get(1)?;
    let kind = kind.parse::<ResourceKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Resource {
        resource: row.get(0)?,
        kind,
        prefix: row.get(2)?,
        path: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn find_by_kind_filters() {
        let conn = Connection::open_in_memory().unwrap();
        Schema.initialize(&conn).unwrap();
        let dao = ResourceDao;

        dao.insert(
            &conn,
            &Resource {
                resource: "@BlogBundle/Resources/config/routing.yml".to_string(),
                kind: ResourceKind::Routing,
                prefix: Some("/blog".to_string()),
                path: "app/config/routing.yml".to_string(),
            },
        )
        .unwrap();
        dao.insert(
            &conn,
            &Resource {
                resource: "services.xml".to_string(),
                kind: ResourceKind::Services,
                prefix: None,
                path: "app/config/config.yml".to_string(),
            },
        )
        .unwrap();

        let routing = dao.find_by_kind(&conn, ResourceKind::Routing).unwrap();
        assert_eq!(routing.len(), 1);
        assert_eq!(routing[0].prefix.as_deref(), Some("/blog"));
        assert!(dao
            .find_by_kind(&conn, ResourceKind::Translation)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_stored_kind_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        Schema.initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO resources (resource, kind, path) VALUES ('x', 'bogus', 'y')",
            [],
        )
        .unwrap();

        assert!(ResourceDao.find_all(&conn).is_err());
    }
}
