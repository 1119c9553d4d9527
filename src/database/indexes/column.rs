//! Column Index Operations
//!
//! Equality indexes map `column = value` to the set of row ids holding that
//! value. They answer `=` conditions only.

use crate::catalog::TableKeys;
use crate::database::core::TableEngine;
use crate::scan;
use crate::types::{RowId, TableName};
use crate::Result;
use tracing::{info, warn};

/// Progress of an index removal
///
/// The column leaves the index metadata before its index keys are deleted.
/// Between the two steps queries already treat the column as unindexed while
/// stale index keys may still exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTeardown {
    Indexed,
    MetadataCleared,
    FullyRemoved,
}

impl IndexTeardown {
    fn advance(self) -> Self {
        match self {
            IndexTeardown::Indexed => IndexTeardown::MetadataCleared,
            IndexTeardown::MetadataCleared | IndexTeardown::FullyRemoved => {
                IndexTeardown::FullyRemoved
            }
        }
    }
}

/// Outcome of `drop_index`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropIndexReport {
    pub state: IndexTeardown,
    /// Index keys deleted
    pub keys_removed: usize,
}

impl TableEngine {
    /// Whether `column` carries an equality index
    pub fn is_indexed(&self, table: &TableName, column: &str) -> Result<bool> {
        self.store
            .sismember(&TableKeys::new(table).index_meta(), column)
    }

    /// Index an existing column and build its entries from the current rows
    ///
    /// Rows inserted while the rebuild runs are indexed by the insert path
    /// once the column is marked, which happens first. Running it again on an
    /// indexed column re-runs the rebuild. Returns the number of rows indexed.
    ///
    /// # Example
    /// ```ignore
    /// engine.add_index(&table, "email")?;
    /// // SELECT ... WHERE email=a@b.c is now answered from the index
    /// ```
    pub fn add_index(&self, table: &TableName, column: &str) -> Result<usize> {
        self.registry.ensure_table(table)?;
        self.registry.column_type(table, column)?;

        let keys = TableKeys::new(table);
        self.store.sadd(&keys.index_meta(), column)?;

        let mut indexed = 0;
        for id in self.executor.all_rows(&keys)? {
            if let Some(value) = self.store.hget(&keys.row(id), column)? {
                self.store.sadd(&keys.index(column, &value), &id.to_string())?;
                indexed += 1;
            }
        }

        info!(table = %table, column, rows = indexed, "index added");
        Ok(indexed)
    }

    /// Remove a column's index: metadata first, then every index key
    pub fn drop_index(&self, table: &TableName, column: &str) -> Result<DropIndexReport> {
        self.registry.ensure_table(table)?;
        self.registry.column_type(table, column)?;

        let keys = TableKeys::new(table);
        let mut state = IndexTeardown::Indexed;

        self.store.srem(&keys.index_meta(), column)?;
        state = state.advance();
        warn!(table = %table, column, "index metadata cleared, deleting index keys");

        let keys_removed = match scan::delete_matching(
            self.store.as_ref(),
            &keys.index_pattern(column),
            self.config.scan_page_size,
        ) {
            Ok(n) => n,
            Err(e) => {
                warn!(table = %table, column, ?state, error = %e, "index teardown interrupted");
                return Err(e);
            }
        };
        state = state.advance();

        info!(table = %table, column, keys_removed, "index dropped");
        Ok(DropIndexReport {
            state,
            keys_removed,
        })
    }

    /// Move row `id` from the index set of `old` to that of `new`
    ///
    /// Does nothing when the column is unindexed or the value is unchanged.
    pub fn update_index_on_change(
        &self,
        table: &TableName,
        column: &str,
        old: Option<&str>,
        new: &str,
        id: RowId,
    ) -> Result<()> {
        if !self.is_indexed(table, column)? {
            return Ok(());
        }
        self.reindex_value(&TableKeys::new(table), column, old, new, id)
    }

    pub(crate) fn reindex_value(
        &self,
        keys: &TableKeys,
        column: &str,
        old: Option<&str>,
        new: &str,
        id: RowId,
    ) -> Result<()> {
        if old == Some(new) {
            return Ok(());
        }

        let member = id.to_string();
        if let Some(old) = old {
            self.store.srem(&keys.index(column, old), &member)?;
        }
        self.store.sadd(&keys.index(column, new), &member)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::query::{CompareOp, Condition, WhereClause};
    use crate::types::{ColumnDef, ColumnType};
    use crate::TableError;

    fn engine() -> (TableEngine, TableName) {
        let engine = TableEngine::in_memory(EngineConfig::for_testing());
        let table = TableName::new("app", "users");
        engine.create_namespace("app").unwrap();
        engine
            .create_table(
                &table,
                &[
                    ColumnDef::new("email", ColumnType::String),
                    ColumnDef::new("status", ColumnType::String).indexed(),
                ],
            )
            .unwrap();
        (engine, table)
    }

    fn insert(engine: &TableEngine, table: &TableName, email: &str, status: &str) -> RowId {
        engine
            .insert_row(
                table,
                &[("email".into(), email.into()), ("status".into(), status.into())],
            )
            .unwrap()
    }

    fn eq(column: &str, value: &str) -> WhereClause {
        WhereClause::new(Condition::new(column, CompareOp::Eq, value))
    }

    #[test]
    fn test_add_index_rebuilds() {
        let (engine, table) = engine();
        insert(&engine, &table, "a@x", "on");
        insert(&engine, &table, "b@x", "on");

        assert!(matches!(
            engine.select(&table, Some(&eq("email", "a@x"))),
            Err(TableError::NonIndexedEquality(_))
        ));

        assert_eq!(engine.add_index(&table, "email").unwrap(), 2);
        assert!(engine.is_indexed(&table, "email").unwrap());
        let rows = engine.select(&table, Some(&eq("email", "a@x"))).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);

        // Re-running is harmless
        assert_eq!(engine.add_index(&table, "email").unwrap(), 2);
        assert!(matches!(
            engine.add_index(&table, "phone"),
            Err(TableError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_drop_index() {
        let (engine, table) = engine();
        insert(&engine, &table, "a@x", "on");
        insert(&engine, &table, "b@x", "off");

        let report = engine.drop_index(&table, "status").unwrap();
        assert_eq!(report.state, IndexTeardown::FullyRemoved);
        assert_eq!(report.keys_removed, 2);
        assert!(!engine.is_indexed(&table, "status").unwrap());

        let keys = TableKeys::new(&table);
        assert!(crate::scan::collect_keys(engine.store().as_ref(), &keys.index_pattern("status"), 5)
            .unwrap()
            .is_empty());
        assert!(matches!(
            engine.select(&table, Some(&eq("status", "on"))),
            Err(TableError::NonIndexedEquality(_))
        ));

        assert!(matches!(
            engine.drop_index(&table, "phone"),
            Err(TableError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_drop_index_leaves_similar_columns() {
        let engine = TableEngine::in_memory(EngineConfig::for_testing());
        let table = TableName::new("app", "t");
        engine.create_namespace("app").unwrap();
        engine
            .create_table(
                &table,
                &[
                    ColumnDef::new("s", ColumnType::String).indexed(),
                    ColumnDef::new("s2", ColumnType::String).indexed(),
                ],
            )
            .unwrap();
        engine
            .insert_row(&table, &[("s".into(), "v".into()), ("s2".into(), "v".into())])
            .unwrap();

        assert_eq!(engine.drop_index(&table, "s").unwrap().keys_removed, 1);
        assert_eq!(engine.select(&table, Some(&eq("s2", "v"))).unwrap().len(), 1);
    }

    #[test]
    fn test_update_index_on_change() {
        let (engine, table) = engine();
        let id = insert(&engine, &table, "a@x", "on");
        let keys = TableKeys::new(&table);
        let store = engine.store();

        engine
            .update_index_on_change(&table, "status", Some("on"), "off", id)
            .unwrap();
        assert!(!store.sismember(&keys.index("status", "on"), "1").unwrap());
        assert!(store.sismember(&keys.index("status", "off"), "1").unwrap());

        // Unindexed column: nothing written
        engine
            .update_index_on_change(&table, "email", Some("a@x"), "b@x", id)
            .unwrap();
        assert!(!store.sismember(&keys.index("email", "b@x"), "1").unwrap());

        // Same value: no-op
        engine
            .update_index_on_change(&table, "status", Some("off"), "off", id)
            .unwrap();
        assert!(store.sismember(&keys.index("status", "off"), "1").unwrap());
    }
}
