//! Translation units.

use rusqlite::{params, Connection, Row};
use symdex_types::TransUnit;

use super::{collect_rows, IndexDao};
use crate::error::Result;

/// Access to the `trans_units` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransUnitDao;

impl IndexDao for TransUnitDao {
    const TABLE: &'static str = "trans_units";
}

impl TransUnitDao {
    /// Stores a translation, replacing the same key and language from the same catalogue.
    pub fn insert(&self, conn: &Connection, unit: &TransUnit) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO trans_units (name, value, language, path) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (name, language, path) DO UPDATE SET value = excluded.value",
        )?;
        stmt.execute(params![unit.name, unit.value, unit.language, unit.path])?;
        Ok(())
    }

    /// Translations of `name`, either in every language or in just `language`.
    pub fn find_by_name(
        &self,
        conn: &Connection,
        name: &str,
        language: Option<&str>,
    ) -> Result<Vec<TransUnit>> {
        let mut stmt = conn.prepare_cached(
            "SELECT name, value, language, path FROM trans_units
             WHERE name = ?1 AND (?2 IS NULL OR language = ?2)
             ORDER BY language ASC, path ASC",
        )?;
        let rows = stmt.query_map(params![name, language], map_row)?;
        collect_rows(rows)
    }

    /// Distinct languages with at least one translation.
    pub fn languages(&self, conn: &Connection) -> Result<Vec<String>> {
        let mut stmt =
            conn.prepare_cached("SELECT DISTINCT language FROM trans_units ORDER BY language ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        collect_rows(rows)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<TransUnit> {
    Ok(TransUnit {
        name: row.get(0)?,
        value: row.get(1)?,
        language: row.get(2)?,
        path: row.get(3)?,
    })
}
