//! Engine Core - TableEngine structure and construction
//!
//! This module contains:
//! - TableEngine struct definition
//! - new() / in_memory() constructors
//! - Shared helpers used by the other `impl TableEngine` blocks

use crate::catalog::{TableKeys, TableRegistry};
use crate::config::EngineConfig;
use crate::query::{QueryExecutor, QueryPlanner, WhereClause};
use crate::store::{KvStore, MemoryStore};
use crate::types::{RowId, TableName};
use crate::Result;
use ahash::AHashSet;
use std::sync::Arc;

/// Tabular query engine over a key-value store
///
/// The engine holds no table state of its own; every operation reads and
/// writes the store through its primitives.
pub struct TableEngine {
    pub(crate) store: Arc<dyn KvStore>,
    pub(crate) registry: TableRegistry,
    pub(crate) executor: QueryExecutor,
    pub(crate) config: EngineConfig,
}

impl TableEngine {
    /// Create an engine over an existing store
    pub fn new(store: Arc<dyn KvStore>, config: EngineConfig) -> Self {
        Self {
            registry: TableRegistry::new(store.clone()),
            executor: QueryExecutor::new(store.clone(), config.max_rows_scan),
            store,
            config,
        }
    }

    /// Create an engine over a fresh `MemoryStore`
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Row ids matching an optional WHERE clause, sorted ascending
    pub(crate) fn resolve_rows(
        &self,
        table: &TableName,
        clause: Option<&WhereClause>,
    ) -> Result<Vec<RowId>> {
        let plan = QueryPlanner::new(&self.registry).plan(table, clause)?;
        let rows: AHashSet<RowId> = self.executor.execute(&TableKeys::new(table), &plan)?;

        let mut ids = Vec::new();
        ids.try_reserve(rows.len())?;
        ids.extend(rows);
        ids.sort_unstable();
        Ok(ids)
    }
}
