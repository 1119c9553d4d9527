//! Qualified table names

use crate::error::{Result, TableError};
use std::fmt;

/// Maximum length, in characters, of a namespace or table name
pub const MAX_NAME_LEN: usize = 64;

/// `namespace.table`, split on the first dot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName {
    namespace: String,
    table: String,
}

impl TableName {
    /// Split `full` on its first `.`.
    ///
    /// Both halves must be non-empty. The table half may itself contain dots.
    pub fn parse(full: &str) -> Result<Self> {
        match full.split_once('.') {
            Some((ns, table)) if !ns.is_empty() && !table.is_empty() => Ok(Self {
                namespace: ns.to_string(),
                table: table.to_string(),
            }),
            _ => Err(TableError::MalformedName(full.to_string())),
        }
    }

    pub fn new(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `namespace.table`
    pub fn full(&self) -> String {
        format!("{}.{}", self.namespace, self.table)
    }

    /// Check both halves against the naming rules of [`validate_name`].
    pub fn validate(&self) -> Result<()> {
        validate_name("namespace", &self.namespace)?;
        validate_name("table", &self.table)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.table)
    }
}

/// At most [`MAX_NAME_LEN`] characters and no `{` or `}`, which delimit
/// the hash tag of table keys.
pub(crate) fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    let invalid = |reason: String| TableError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    };

    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid(format!(
            "it exceeds the limit of {} characters",
            MAX_NAME_LEN
        )));
    }
    if name.contains(['{', '}']) {
        return Err(invalid("it must not contain '{' or '}'".into()));
    }
    Ok(())
}
