//! CRUD Operations Module
//!
//! Row-level operations (next_row_id, insert_row, fetch_row, delete_row) and
//! the WHERE-driven select/update/delete built on top of them.

use super::core::TableEngine;
use crate::catalog::TableKeys;
use crate::query::{type_check, WhereClause};
use crate::store::KeyType;
use crate::types::{ColumnType, Row, RowId, TableName};
use crate::{Result, TableError};
use ahash::AHashMap;
use std::collections::BTreeMap;
use tracing::debug;

impl TableEngine {
    // ==================== Row-Level Operations ====================

    /// Allocate the next row id of a table (monotonic, never reused)
    pub fn next_row_id(&self, table: &TableName) -> Result<RowId> {
        let id = self.store.incr(&TableKeys::new(table).counter())?;
        RowId::try_from(id)
            .map_err(|_| TableError::Store(format!("row id counter of {} is negative", table)))
    }

    /// Insert a row and return its id
    ///
    /// Every field is validated before the id is allocated, so a failing
    /// insert persists nothing. When a column is assigned twice the last
    /// assignment wins.
    ///
    /// # Example
    /// ```ignore
    /// let id = engine.insert_row(&table, &[("age".into(), "42".into())])?;
    /// ```
    pub fn insert_row(&self, table: &TableName, fields: &[(String, String)]) -> Result<RowId> {
        self.registry.ensure_table(table)?;
        if fields.is_empty() {
            return Err(TableError::syntax("INSERT requires at least one <col>=<value>"));
        }

        let types = self.registry.column_types(table)?;
        let fields = validate_fields(table, &types, fields)?;
        let indexed = self.registry.indexed_columns(table)?;

        let keys = TableKeys::new(table);
        let id = self.next_row_id(table)?;
        let row_key = keys.row(id);
        let member = id.to_string();

        for (column, value) in &fields {
            self.store.hset(&row_key, column, value)?;
        }
        self.store.sadd(&keys.rows(), &member)?;
        for (column, value) in &fields {
            if indexed.contains(*column) {
                self.store.sadd(&keys.index(column, value), &member)?;
            }
        }

        debug!(table = %table, row_id = id, fields = fields.len(), "row inserted");
        Ok(id)
    }

    /// Read a row's fields; `None` if the row key no longer exists
    pub fn fetch_row(&self, table: &TableName, id: RowId) -> Result<Option<Row>> {
        let fields = self.store.hgetall(&TableKeys::new(table).row(id))?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(Row::new(id, fields)))
    }

    /// Remove a row, its index memberships and its RowSet entry
    pub fn delete_row(&self, table: &TableName, id: RowId) -> Result<()> {
        let keys = TableKeys::new(table);
        let indexed = self.registry.indexed_columns(table)?;
        let row_key = keys.row(id);
        let member = id.to_string();

        for column in &indexed {
            // An index set already gone for this value is not an error
            if let Some(value) = self.store.hget(&row_key, column)? {
                self.store.srem(&keys.index(column, &value), &member)?;
            }
        }

        self.store.del(&row_key)?;
        self.store.srem(&keys.rows(), &member)?;
        Ok(())
    }

    // ==================== Query Operations ====================

    /// Rows matching `clause` (all rows without one), ordered by id
    ///
    /// Rows whose fields vanished between resolution and read are skipped.
    pub fn select(&self, table: &TableName, clause: Option<&WhereClause>) -> Result<Vec<Row>> {
        let ids = self.resolve_rows(table, clause)?;

        let mut rows = Vec::new();
        rows.try_reserve(ids.len())?;
        for id in ids {
            if let Some(row) = self.fetch_row(table, id)? {
                rows.push(row);
            }
        }

        debug!(table = %table, rows = rows.len(), "select");
        Ok(rows)
    }

    /// Apply `assignments` to every matching row and return how many changed
    pub fn update(
        &self,
        table: &TableName,
        clause: Option<&WhereClause>,
        assignments: &[(String, String)],
    ) -> Result<usize> {
        self.registry.ensure_table(table)?;
        if assignments.is_empty() {
            return Err(TableError::syntax("missing SET"));
        }

        let types = self.registry.column_types(table)?;
        let assignments = validate_fields(table, &types, assignments)?;
        let indexed = self.registry.indexed_columns(table)?;
        let ids = self.resolve_rows(table, clause)?;

        let keys = TableKeys::new(table);
        let mut updated = 0;
        for id in ids {
            let row_key = keys.row(id);
            if self.store.key_type(&row_key)? == KeyType::Empty {
                continue;
            }

            for (column, value) in &assignments {
                let old = self.store.hget(&row_key, column)?;
                self.store.hset(&row_key, column, value)?;
                if indexed.contains(*column) {
                    self.reindex_value(&keys, column, old.as_deref(), value, id)?;
                }
            }
            updated += 1;
        }

        debug!(table = %table, updated, "update");
        Ok(updated)
    }

    /// Delete every matching row and return how many were removed
    pub fn delete(&self, table: &TableName, clause: Option<&WhereClause>) -> Result<usize> {
        let ids = self.resolve_rows(table, clause)?;
        let count = ids.len();
        for id in ids {
            self.delete_row(table, id)?;
        }

        debug!(table = %table, deleted = count, "delete");
        Ok(count)
    }
}

/// Type-check `column=value` pairs; duplicate columns keep the last value.
fn validate_fields<'a>(
    table: &TableName,
    types: &AHashMap<String, ColumnType>,
    fields: &'a [(String, String)],
) -> Result<BTreeMap<&'a str, &'a str>> {
    let mut validated = BTreeMap::new();
    for (column, value) in fields {
        let col_type = types
            .get(column)
            .ok_or_else(|| TableError::ColumnNotFound(format!("{} in {}", column, table)))?;
        type_check(column, *col_type, value)?;
        validated.insert(column.as_str(), value.as_str());
    }
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::database::TableEngine;
    use crate::query::{CompareOp, Condition, WhereClause};
    use crate::types::{ColumnDef, ColumnType, TableName};
    use crate::TableError;

    fn field(col: &str, val: &str) -> (String, String) {
        (col.to_string(), val.to_string())
    }

    fn engine() -> (TableEngine, TableName) {
        let engine = TableEngine::in_memory(EngineConfig::for_testing());
        let table = TableName::new("app", "users");
        engine.create_namespace("app").unwrap();
        engine
            .create_table(
                &table,
                &[
                    ColumnDef::new("name", ColumnType::String),
                    ColumnDef::new("age", ColumnType::Integer),
                    ColumnDef::new("status", ColumnType::String).indexed(),
                ],
            )
            .unwrap();
        (engine, table)
    }

    fn status_is(value: &str) -> WhereClause {
        WhereClause::new(Condition::new("status", CompareOp::Eq, value))
    }

    #[test]
    fn test_insert_and_fetch() {
        let (engine, table) = engine();
        let id = engine
            .insert_row(&table, &[field("name", "ada"), field("age", "36")])
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(engine.next_row_id(&table).unwrap(), 2);

        let row = engine.fetch_row(&table, id).unwrap().unwrap();
        assert_eq!(row.flatten(), vec!["age", "36", "name", "ada"]);
        assert!(engine.fetch_row(&table, 99).unwrap().is_none());
    }

    #[test]
    fn test_failed_insert_persists_nothing() {
        let (engine, table) = engine();
        let err = engine
            .insert_row(&table, &[field("name", "bob"), field("age", "abc")])
            .unwrap_err();
        assert!(matches!(err, TableError::TypeMismatch { .. }));

        let err = engine
            .insert_row(&table, &[field("email", "x")])
            .unwrap_err();
        assert!(matches!(err, TableError::ColumnNotFound(_)));

        assert!(engine.select(&table, None).unwrap().is_empty());
        // No id was consumed
        assert_eq!(engine.insert_row(&table, &[field("name", "bob")]).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_column_last_wins() {
        let (engine, table) = engine();
        let id = engine
            .insert_row(&table, &[field("status", "a"), field("status", "b")])
            .unwrap();
        assert_eq!(engine.fetch_row(&table, id).unwrap().unwrap().get("status"), Some("b"));
        assert!(engine.select(&table, Some(&status_is("a"))).unwrap().is_empty());
        assert_eq!(engine.select(&table, Some(&status_is("b"))).unwrap().len(), 1);
    }

    #[test]
    fn test_update_moves_index_entry() {
        let (engine, table) = engine();
        engine.insert_row(&table, &[field("status", "active")]).unwrap();

        let n = engine
            .update(&table, Some(&status_is("active")), &[field("status", "inactive")])
            .unwrap();
        assert_eq!(n, 1);
        assert!(engine.select(&table, Some(&status_is("active"))).unwrap().is_empty());
        assert_eq!(engine.select(&table, Some(&status_is("inactive"))).unwrap().len(), 1);
    }

    #[test]
    fn test_update_validates_before_writing() {
        let (engine, table) = engine();
        engine.insert_row(&table, &[field("age", "1")]).unwrap();

        assert!(matches!(
            engine.update(&table, None, &[field("age", "x")]),
            Err(TableError::TypeMismatch { .. })
        ));
        assert!(matches!(engine.update(&table, None, &[]), Err(TableError::Syntax(_))));
        assert_eq!(engine.select(&table, None).unwrap()[0].get("age"), Some("1"));
    }

    #[test]
    fn test_delete_cleans_up() {
        let (engine, table) = engine();
        engine.insert_row(&table, &[field("status", "x")]).unwrap();
        engine.insert_row(&table, &[field("status", "y")]).unwrap();

        assert_eq!(engine.delete(&table, Some(&status_is("x"))).unwrap(), 1);
        assert!(engine.select(&table, Some(&status_is("x"))).unwrap().is_empty());
        assert_eq!(engine.select(&table, None).unwrap().len(), 1);

        assert_eq!(engine.delete(&table, None).unwrap(), 1);
        assert!(engine.select(&table, None).unwrap().is_empty());
    }

    #[test]
    fn test_select_skips_vanished_rows() {
        let (engine, table) = engine();
        let id = engine.insert_row(&table, &[field("name", "a")]).unwrap();
        engine.insert_row(&table, &[field("name", "b")]).unwrap();

        // Row hash gone while its id is still in the RowSet
        engine
            .store()
            .del(&crate::catalog::TableKeys::new(&table).row(id))
            .unwrap();

        let rows = engine.select(&table, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some("b"));
    }
}
