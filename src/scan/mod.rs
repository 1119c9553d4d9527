//! Cursor-based keyspace enumeration
//!
//! Every store-wide walk goes through [`KeyScan`], a lazy batch iterator over
//! the store's paged `scan`. Callers drive it to exhaustion; each step does one
//! bounded page of work.
//!
//! # Module Structure
//! - `KeyScan`: resumable iterator yielding one page of matching keys per step
//! - `collect_keys`: accumulate a whole scan, failing with `OutOfMemory` on allocation failure
//! - `delete_matching`: collect, then delete, every matching key
//! - `list_tables`: enumerate `namespace.table` pairs from schema keys

use crate::catalog::keys::{parse_schema_key, TABLE_SCHEMA_PATTERN};
use crate::error::Result;
use crate::store::{pattern, KvStore, ScanCursor};
use crate::types::TableName;
use tracing::{debug, trace};

/// Lazy, resumable scan over keys matching a glob pattern
pub struct KeyScan<'a> {
    store: &'a dyn KvStore,
    pattern: String,
    page_size: usize,
    cursor: ScanCursor,
}

impl<'a> KeyScan<'a> {
    pub fn new(store: &'a dyn KvStore, pattern: impl Into<String>, page_size: usize) -> Self {
        Self {
            store,
            pattern: pattern.into(),
            page_size: page_size.max(1),
            cursor: ScanCursor::Start,
        }
    }

    /// Current continuation token
    pub fn cursor(&self) -> &ScanCursor {
        &self.cursor
    }
}

impl Iterator for KeyScan<'_> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_done() {
            return None;
        }

        match self.store.scan(&self.cursor, &self.pattern, self.page_size) {
            Ok(page) => {
                trace!(pattern = %self.pattern, matched = page.keys.len(), "scan page");
                self.cursor = page.cursor;
                Some(Ok(page.keys))
            }
            Err(e) => {
                self.cursor = ScanCursor::Done;
                Some(Err(e))
            }
        }
    }
}

/// Collect every key matching `pattern`.
pub fn collect_keys(store: &dyn KvStore, pattern: &str, page_size: usize) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for batch in KeyScan::new(store, pattern, page_size) {
        let batch = batch?;
        keys.try_reserve(batch.len())?;
        keys.extend(batch);
    }
    Ok(keys)
}

/// Delete every key matching `pattern`.
///
/// The whole key list is gathered before the first deletion, so running out of
/// memory leaves the store untouched. Returns the number of keys removed.
pub fn delete_matching(store: &dyn KvStore, pattern: &str, page_size: usize) -> Result<usize> {
    let keys = collect_keys(store, pattern, page_size)?;
    let mut removed = 0;
    for key in &keys {
        if store.del(key)? {
            removed += 1;
        }
    }
    debug!(pattern, removed, "deleted matching keys");
    Ok(removed)
}

/// List tables, optionally restricted to one namespace.
///
/// Sorted by namespace, then table. Namespace markers are skipped.
pub fn list_tables(
    store: &dyn KvStore,
    namespace: Option<&str>,
    page_size: usize,
) -> Result<Vec<TableName>> {
    let glob = match namespace {
        Some(ns) => format!("schema:{{{}.*}}", pattern::escape(ns)),
        None => TABLE_SCHEMA_PATTERN.to_string(),
    };

    let mut tables: Vec<TableName> = Vec::new();
    for batch in KeyScan::new(store, glob, page_size) {
        let batch = batch?;
        tables.try_reserve(batch.len())?;
        tables.extend(
            batch
                .iter()
                .filter_map(|key| parse_schema_key(key))
                .filter(|name| namespace.map_or(true, |ns| name.namespace() == ns)),
        );
    }

    // Stores may report a key more than once across pages
    tables.sort();
    tables.dedup();
    Ok(tables)
}
