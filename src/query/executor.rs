//! Query execution: resolves a plan into a set of row ids

use super::planner::{Access, ExecutionPlan, Step};
use super::predicate::Condition;
use crate::catalog::TableKeys;
use crate::error::{Result, TableError};
use crate::store::KvStore;
use crate::types::{ColumnType, RowId};
use ahash::AHashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Executes plans against the store
///
/// The scan limit bounds how many rows a single filter pass may read.
pub struct QueryExecutor {
    store: Arc<dyn KvStore>,
    max_rows_scan: usize,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn KvStore>, max_rows_scan: usize) -> Self {
        Self {
            store,
            max_rows_scan,
        }
    }

    pub fn max_rows_scan(&self) -> usize {
        self.max_rows_scan
    }

    /// Run every step of `plan` and return the surviving row ids.
    pub fn execute(&self, keys: &TableKeys, plan: &ExecutionPlan) -> Result<AHashSet<RowId>> {
        let mut rows = AHashSet::new();

        for step in &plan.steps {
            match step {
                Step::Seed(access) => {
                    rows = self.access(keys, access)?;
                    debug!(?access, candidates = rows.len(), "seeded candidate set");
                }
                Step::Narrow {
                    condition,
                    col_type,
                } => {
                    self.filter(keys, &mut rows, condition, *col_type)?;
                    debug!(%condition, remaining = rows.len(), "narrowed candidate set");
                }
                Step::Union(access) => {
                    let extra = self.access(keys, access)?;
                    rows.try_reserve(extra.len())?;
                    rows.extend(extra);
                    debug!(?access, candidates = rows.len(), "unioned candidate set");
                }
            }
        }

        Ok(rows)
    }

    fn access(&self, keys: &TableKeys, access: &Access) -> Result<AHashSet<RowId>> {
        match access {
            Access::AllRows => self.all_rows(keys),
            Access::IndexLookup { column, value } => self.index_lookup(keys, column, value),
            Access::Scan {
                condition,
                col_type,
            } => {
                let mut rows = self.all_rows(keys)?;
                self.filter(keys, &mut rows, condition, *col_type)?;
                Ok(rows)
            }
        }
    }

    /// Every live row id of the table
    pub fn all_rows(&self, keys: &TableKeys) -> Result<AHashSet<RowId>> {
        to_row_ids(self.store.smembers(&keys.rows())?)
    }

    /// Row ids recorded in the equality index for `column = value`
    pub fn index_lookup(&self, keys: &TableKeys, column: &str, value: &str) -> Result<AHashSet<RowId>> {
        to_row_ids(self.store.smembers(&keys.index(column, value))?)
    }

    /// Remove candidates whose `column` value does not satisfy `condition`.
    ///
    /// Rows lacking the column are removed. Fails once more than
    /// `max_rows_scan` rows have been examined.
    pub fn filter(
        &self,
        keys: &TableKeys,
        rows: &mut AHashSet<RowId>,
        condition: &Condition,
        col_type: ColumnType,
    ) -> Result<()> {
        let mut rejected: Vec<RowId> = Vec::new();
        let mut examined = 0usize;

        for &id in rows.iter() {
            examined += 1;
            if examined > self.max_rows_scan {
                debug!(limit = self.max_rows_scan, %condition, "scan limit exceeded");
                return Err(TableError::ScanLimitExceeded {
                    limit: self.max_rows_scan,
                });
            }

            let keep = match self.store.hget(&keys.row(id), &condition.column)? {
                Some(stored) => condition.matches(&stored, col_type),
                None => false,
            };
            if !keep {
                rejected.try_reserve(1)?;
                rejected.push(id);
            }
        }

        trace!(examined, rejected = rejected.len(), "filter pass");
        for id in rejected {
            rows.remove(&id);
        }
        Ok(())
    }
}

fn to_row_ids(members: Vec<String>) -> Result<AHashSet<RowId>> {
    let mut ids = AHashSet::new();
    ids.try_reserve(members.len())?;
    for member in members {
        match member.parse::<RowId>() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(_) => trace!(member, "skipping non-numeric row id"),
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::CompareOp;
    use crate::store::MemoryStore;
    use crate::types::TableName;

    fn seeded(rows: usize) -> (Arc<dyn KvStore>, TableKeys) {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let keys = TableKeys::new(&TableName::new("app", "t"));
        for id in 1..=rows as RowId {
            store.sadd(&keys.rows(), &id.to_string()).unwrap();
            store.hset(&keys.row(id), "n", &id.to_string()).unwrap();
        }
        (store, keys)
    }

    #[test]
    fn test_filter_narrows() {
        let (store, keys) = seeded(10);
        let executor = QueryExecutor::new(store.clone(), 100);

        let mut rows = executor.all_rows(&keys).unwrap();
        let cond = Condition::new("n", CompareOp::Gt, "7");
        executor
            .filter(&keys, &mut rows, &cond, ColumnType::Integer)
            .unwrap();

        let mut ids: Vec<RowId> = rows.into_iter().collect();
        ids.sort();
        assert_eq!(ids, vec![8, 9, 10]);
    }

    #[test]
    fn test_filter_missing_column_does_not_match() {
        let (store, keys) = seeded(3);
        store.hdel(&keys.row(2), "n").unwrap();
        store.hset(&keys.row(2), "other", "x").unwrap();

        let executor = QueryExecutor::new(store, 100);
        let mut rows = executor.all_rows(&keys).unwrap();
        let cond = Condition::new("n", CompareOp::GtEq, "0");
        executor
            .filter(&keys, &mut rows, &cond, ColumnType::Integer)
            .unwrap();
        assert!(!rows.contains(&2));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_scan_limit_boundary() {
        let cond = Condition::new("n", CompareOp::Gt, "0");

        let (store, keys) = seeded(5);
        let executor = QueryExecutor::new(store, 5);
        let mut rows = executor.all_rows(&keys).unwrap();
        assert!(executor
            .filter(&keys, &mut rows, &cond, ColumnType::Integer)
            .is_ok());

        let (store, keys) = seeded(6);
        let executor = QueryExecutor::new(store, 5);
        let mut rows = executor.all_rows(&keys).unwrap();
        assert!(matches!(
            executor.filter(&keys, &mut rows, &cond, ColumnType::Integer),
            Err(TableError::ScanLimitExceeded { limit: 5 })
        ));
    }

    #[test]
    fn test_index_lookup() {
        let (store, keys) = seeded(2);
        store.sadd(&keys.index("s", "on"), "2").unwrap();

        let executor = QueryExecutor::new(store, 100);
        let rows = executor.index_lookup(&keys, "s", "on").unwrap();
        assert_eq!(rows.into_iter().collect::<Vec<_>>(), vec![2]);
        assert!(executor.index_lookup(&keys, "s", "off").unwrap().is_empty());
    }
}
