//! Namespace and Table Management
//!
//! Creation, description, listing and removal of namespaces and tables.

use super::core::TableEngine;
use crate::catalog::TableKeys;
use crate::scan;
use crate::types::{ColumnDef, TableName, TableSchema};
use crate::Result;
use tracing::info;

impl TableEngine {
    /// Create a namespace
    pub fn create_namespace(&self, namespace: &str) -> Result<()> {
        self.registry.create_namespace(namespace)
    }

    /// Create a new table with its columns
    ///
    /// # Example
    /// ```ignore
    /// use kvtable::types::{ColumnDef, ColumnType, TableName};
    ///
    /// engine.create_namespace("app")?;
    /// engine.create_table(
    ///     &TableName::parse("app.users")?,
    ///     &[
    ///         ColumnDef::new("name", ColumnType::String),
    ///         ColumnDef::new("status", ColumnType::String).indexed(),
    ///     ],
    /// )?;
    /// ```
    pub fn create_table(&self, table: &TableName, columns: &[ColumnDef]) -> Result<()> {
        self.registry.create_table(table, columns)
    }

    /// Add a column to an existing table
    pub fn add_column(&self, table: &TableName, column: &ColumnDef) -> Result<()> {
        self.registry.add_column(table, column)
    }

    /// Columns of a table with their types and index flags, sorted by name
    pub fn describe_table(&self, table: &TableName) -> Result<TableSchema> {
        self.registry.describe(table)
    }

    /// All tables, or those of one namespace, sorted by namespace then table
    pub fn list_tables(&self, namespace: Option<&str>) -> Result<Vec<TableName>> {
        scan::list_tables(self.store.as_ref(), namespace, self.config.scan_page_size)
    }

    /// Remove a table with all of its rows, indexes and metadata
    ///
    /// The schema key goes last, so an interrupted drop can be re-run.
    pub fn drop_table(&self, table: &TableName) -> Result<()> {
        self.registry.ensure_table(table)?;

        let keys = TableKeys::new(table);
        let removed = scan::delete_matching(
            self.store.as_ref(),
            &keys.all_pattern(),
            self.config.scan_page_size,
        )?;
        self.store.del(&keys.schema())?;

        info!(table = %table, keys_removed = removed + 1, "table dropped");
        Ok(())
    }
}
