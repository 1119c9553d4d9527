//! Store key layout
//!
//! Every key belonging to a table carries the hash tag `{namespace.table}`, so a
//! cluster-aware store places the whole table on one slot:
//!
//! | key                       | type   | content                    |
//! |---------------------------|--------|----------------------------|
//! | `schema:{ns}`             | string | namespace marker           |
//! | `schema:{ns.t}`           | hash   | column -> type name        |
//! | `{ns.t}:idx:meta`         | set    | indexed column names       |
//! | `{ns.t}:id`               | string | row id counter             |
//! | `{ns.t}:rows`             | set    | live row ids               |
//! | `{ns.t}:<id>`             | hash   | column -> value            |
//! | `{ns.t}:idx:<col>:<val>`  | set    | row ids holding `val`      |

use crate::store::pattern;
use crate::types::{RowId, TableName};

/// Pattern matching every table schema key (namespace markers have no dot)
pub const TABLE_SCHEMA_PATTERN: &str = "schema:{*.*}";

const SCHEMA_PREFIX: &str = "schema:{";

/// Key of a namespace marker
pub fn namespace_key(namespace: &str) -> String {
    format!("{}{}}}", SCHEMA_PREFIX, namespace)
}

/// Recover `(namespace, table)` from a schema key; `None` for namespace markers.
pub fn parse_schema_key(key: &str) -> Option<TableName> {
    let inner = key.strip_prefix(SCHEMA_PREFIX)?.strip_suffix('}')?;
    TableName::parse(inner).ok()
}

/// Key builder for one table
#[derive(Debug, Clone)]
pub struct TableKeys {
    tag: String,
}

impl TableKeys {
    pub fn new(name: &TableName) -> Self {
        Self { tag: name.full() }
    }

    pub fn schema(&self) -> String {
        format!("{}{}}}", SCHEMA_PREFIX, self.tag)
    }

    pub fn index_meta(&self) -> String {
        format!("{{{}}}:idx:meta", self.tag)
    }

    pub fn counter(&self) -> String {
        format!("{{{}}}:id", self.tag)
    }

    pub fn rows(&self) -> String {
        format!("{{{}}}:rows", self.tag)
    }

    pub fn row(&self, id: RowId) -> String {
        format!("{{{}}}:{}", self.tag, id)
    }

    pub fn index(&self, column: &str, value: &str) -> String {
        format!("{{{}}}:idx:{}:{}", self.tag, column, value)
    }

    /// Glob matching every equality index key of `column`
    pub fn index_pattern(&self, column: &str) -> String {
        format!(
            "{{{}}}:idx:{}:*",
            pattern::escape(&self.tag),
            pattern::escape(column)
        )
    }

    /// Glob matching every hash-tagged key of the table (not the schema key)
    pub fn all_pattern(&self) -> String {
        format!("{{{}}}:*", pattern::escape(&self.tag))
    }
}
