//! Route definitions.

use rusqlite::{params, Connection, OptionalExtension, Row};
use symdex_types::Route;

use super::{collect_rows, IndexDao};
use crate::error::Result;

/// Access to the `routes` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteDao;

impl IndexDao for RouteDao {
    const TABLE: &'static str = "routes";
}

impl RouteDao {
    /// Stores a route, replacing a same-named route from the same file.
    pub fn insert(&self, conn: &Connection, route: &Route) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT OR REPLACE INTO routes (name, pattern, controller, path)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![route.name, route.pattern, route.controller, route.path])?;
        Ok(())
    }

    /// Looks up a route by name. If several files define it, the most recently
    /// indexed definition wins.
    pub fn find_by_name(&self, conn: &Connection, name: &str) -> Result<Option<Route>> {
        let mut stmt = conn.prepare_cached(
            "SELECT name, pattern, controller, path FROM routes
             WHERE name = ?1 ORDER BY id DESC LIMIT 1",
        )?;
        Ok(stmt.query_row([name], map_row).optional()?)
    }

    /// Routes dispatching to `controller`.
    pub fn find_by_controller(&self, conn: &Connection, controller: &str) -> Result<Vec<Route>> {
        let mut stmt = conn.prepare_cached(
            "SELECT name, pattern, controller, path FROM routes
             WHERE controller = ?1 ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([controller], map_row)?;
        collect_rows(rows)
    }

    /// Every indexed route, ordered by name.
    pub fn find_all(&self, conn: &Connection) -> Result<Vec<Route>> {
        let mut stmt = conn.prepare_cached(
            "SELECT name, pattern, controller, path FROM routes ORDER BY name ASC, path ASC",
        )?;
        let rows = stmt.query_map([], map_row)?;
        collect_rows(rows)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Route> {
    Ok(Route {
        name: row.get(0)?,
        pattern: row.get(1)?,
        controller: row.get(2)?,
        path: row.get(3)?,
    })
}
