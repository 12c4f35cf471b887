//! Container parameters.

use rusqlite::{params, Connection, OptionalExtension, Row};
use symdex_types::Parameter;

use super::{collect_rows, IndexDao};
use crate::error::Result;

/// Access to the `parameters` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterDao;

impl IndexDao for ParameterDao {
    const TABLE: &'static str = "parameters";
}

impl ParameterDao {
    /// Stores a parameter, replacing the value a file previously declared for the key.
    pub fn insert(&self, conn: &Connection, parameter: &Parameter) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT OR REPLACE INTO parameters (key, value, path) VALUES (?1, ?2, ?3)",
        )?;
        stmt.execute(params![parameter.key, parameter.value, parameter.path])?;
        Ok(())
    }

    /// Looks up a parameter by key; the most recently indexed declaration wins.
    pub fn find_by_key(&self, conn: &Connection, key: &str) -> Result<Option<Parameter>> {
        let mut stmt = conn.prepare_cached(
            "SELECT key, value, path FROM parameters WHERE key = ?1 ORDER BY id DESC LIMIT 1",
        )?;
        Ok(stmt.query_row([key], map_row).optional()?)
    }

    /// Every indexed parameter, ordered by key.
    pub fn find_all(&self, conn: &Connection) -> Result<Vec<Parameter>> {
        let mut stmt =
            conn.prepare_cached("SELECT key, value, path FROM parameters ORDER BY key ASC, path ASC")?;
        let rows = stmt.query_map([], map_row)?;
        collect_rows(rows)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Parameter> {
    Ok(Parameter {
        key: row.get(0)?,
        value: row.get(1)?,
        path: row.get(2)?,
    })
}
