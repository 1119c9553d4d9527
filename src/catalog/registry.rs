//! Table registry: namespaces, table schemas and column types kept in the store

use super::keys::{namespace_key, TableKeys};
use crate::error::{Result, TableError};
use crate::store::{KeyType, KvStore};
use crate::types::{validate_name, ColumnDef, ColumnType, TableName, TableSchema};
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;
use tracing::info;

/// Table registry for managing namespaces and table schemas
///
/// Holds no state of its own: every call reads or writes the store.
#[derive(Clone)]
pub struct TableRegistry {
    store: Arc<dyn KvStore>,
}

impl TableRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    // ==================== Namespaces ====================

    /// Create a namespace marker
    pub fn create_namespace(&self, namespace: &str) -> Result<()> {
        validate_name("namespace", namespace)?;
        if namespace.is_empty() || namespace.contains('.') {
            return Err(TableError::InvalidName {
                kind: "namespace",
                name: namespace.to_string(),
                reason: "it must be non-empty and must not contain '.'".into(),
            });
        }

        let key = namespace_key(namespace);
        if self.store.key_type(&key)? != KeyType::Empty {
            return Err(TableError::AlreadyExists(format!("namespace {}", namespace)));
        }
        self.store.set(&key, "1")?;

        info!(namespace, "namespace created");
        Ok(())
    }

    /// A namespace exists when its scalar marker exists
    pub fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        Ok(self.store.key_type(&namespace_key(namespace))? == KeyType::String)
    }

    // ==================== Tables ====================

    /// A table exists when its schema hash exists
    pub fn table_exists(&self, name: &TableName) -> Result<bool> {
        Ok(self.store.key_type(&TableKeys::new(name).schema())? == KeyType::Hash)
    }

    /// Fail with `TableNotFound` unless the table exists
    pub fn ensure_table(&self, name: &TableName) -> Result<()> {
        if self.table_exists(name)? {
            Ok(())
        } else {
            Err(TableError::TableNotFound(name.full()))
        }
    }

    /// Create a new table
    pub fn create_table(&self, name: &TableName, columns: &[ColumnDef]) -> Result<()> {
        name.validate()?;

        if !self.namespace_exists(name.namespace())? {
            return Err(TableError::NamespaceNotFound(name.namespace().to_string()));
        }

        let keys = TableKeys::new(name);
        if self.store.key_type(&keys.schema())? != KeyType::Empty {
            return Err(TableError::AlreadyExists(format!("table schema {}", name)));
        }

        if columns.is_empty() {
            return Err(TableError::syntax("a table needs at least one column"));
        }

        for column in columns {
            self.store
                .hset(&keys.schema(), &column.name, column.col_type.as_str())?;
            if column.indexed {
                self.store.sadd(&keys.index_meta(), &column.name)?;
            }
        }

        info!(table = %name, columns = columns.len(), "table created");
        Ok(())
    }

    /// Add a column to an existing table
    ///
    /// Existing rows simply lack the column, so an indexed column starts with
    /// no index entries and needs no rebuild.
    pub fn add_column(&self, name: &TableName, column: &ColumnDef) -> Result<()> {
        self.ensure_table(name)?;

        let keys = TableKeys::new(name);
        if self.store.hget(&keys.schema(), &column.name)?.is_some() {
            return Err(TableError::AlreadyExists(format!(
                "column {} in {}",
                column.name, name
            )));
        }

        self.store
            .hset(&keys.schema(), &column.name, column.col_type.as_str())?;
        if column.indexed {
            self.store.sadd(&keys.index_meta(), &column.name)?;
        }

        info!(table = %name, column = %column.name, col_type = %column.col_type, "column added");
        Ok(())
    }

    /// Declared type of a column
    pub fn column_type(&self, name: &TableName, column: &str) -> Result<ColumnType> {
        self.store
            .hget(&TableKeys::new(name).schema(), column)?
            .map(|t| ColumnType::from_stored(&t))
            .ok_or_else(|| TableError::ColumnNotFound(format!("{} in {}", column, name)))
    }

    /// All declared column types of a table
    pub fn column_types(&self, name: &TableName) -> Result<AHashMap<String, ColumnType>> {
        Ok(self
            .store
            .hgetall(&TableKeys::new(name).schema())?
            .into_iter()
            .map(|(col, t)| {
                let ty = ColumnType::from_stored(&t);
                (col, ty)
            })
            .collect())
    }

    /// Names of indexed columns
    pub fn indexed_columns(&self, name: &TableName) -> Result<AHashSet<String>> {
        Ok(self
            .store
            .smembers(&TableKeys::new(name).index_meta())?
            .into_iter()
            .collect())
    }

    /// Columns, types and index flags of a table
    pub fn describe(&self, name: &TableName) -> Result<TableSchema> {
        self.ensure_table(name)?;

        let indexed = self.indexed_columns(name)?;
        let columns = self
            .column_types(name)?
            .into_iter()
            .map(|(col, ty)| ColumnDef {
                indexed: indexed.contains(&col),
                name: col,
                col_type: ty,
            })
            .collect();

        Ok(TableSchema::new(name.clone(), columns))
    }
}
