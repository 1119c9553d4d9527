//! Table metadata and schema definitions

use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::TableName;

/// Column data type
///
/// Every value is stored as a string; the type decides how a value is
/// validated on write and how two values compare in a WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Free text, compared byte-wise
    String,
    /// Optional sign followed by digits, compared numerically
    Integer,
    /// Optional sign, digits, at most one `.`, compared numerically
    Float,
    /// `YYYY-MM-DD`, compared byte-wise (the fixed width sorts chronologically)
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
        }
    }

    /// Interpret a type name read back from the store.
    ///
    /// Unknown names fall back to `String`, the type with no constraints.
    pub fn from_stored(name: &str) -> Self {
        name.parse().unwrap_or(ColumnType::String)
    }

    /// Check that `value` is well formed for this type.
    pub fn validate(&self, value: &str) -> bool {
        match self {
            ColumnType::String => true,
            ColumnType::Integer => is_integer(value),
            ColumnType::Float => is_float(value),
            ColumnType::Date => is_date(value),
        }
    }

    /// Order two stored values of this type.
    ///
    /// Returns `None` when either side cannot be interpreted, which callers
    /// treat as "no match". Float equality is exact: no epsilon is applied.
    pub fn compare(&self, left: &str, right: &str) -> Option<Ordering> {
        match self {
            ColumnType::Integer => compare_integers(left, right),
            ColumnType::Float => {
                let l = left.parse::<f64>().ok()?;
                let r = right.parse::<f64>().ok()?;
                l.partial_cmp(&r)
            }
            ColumnType::Date | ColumnType::String => Some(left.as_bytes().cmp(right.as_bytes())),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(ColumnType::String),
            "integer" => Ok(ColumnType::Integer),
            "float" => Ok(ColumnType::Float),
            "date" => Ok(ColumnType::Date),
            _ => Err(TableError::syntax(format!(
                "unknown column type '{}', expected string, integer, float or date",
                s
            ))),
        }
    }
}

fn split_sign(value: &str) -> (bool, &str) {
    match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    }
}

fn is_integer(value: &str) -> bool {
    let (_, digits) = split_sign(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float(value: &str) -> bool {
    let (_, body) = split_sign(value);
    let mut dots = 0;
    let mut digits = 0;
    for b in body.bytes() {
        match b {
            b'.' => dots += 1,
            b'0'..=b'9' => digits += 1,
            _ => return false,
        }
    }
    dots <= 1 && digits > 0
}

fn is_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Exact comparison of decimal integers of any length.
fn compare_integers(left: &str, right: &str) -> Option<Ordering> {
    if !is_integer(left) || !is_integer(right) {
        return None;
    }

    let normalize = |v: &str| {
        let (negative, digits) = split_sign(v);
        let digits = digits.trim_start_matches('0');
        // -0 and +0 are the same number
        (negative && !digits.is_empty(), digits.to_string())
    };
    let (l_neg, l_mag) = normalize(left);
    let (r_neg, r_mag) = normalize(right);

    let magnitude = || l_mag.len().cmp(&r_mag.len()).then_with(|| l_mag.cmp(&r_mag));

    Some(match (l_neg, r_neg) {
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (false, false) => magnitude(),
        (true, true) => magnitude().reverse(),
    })
}

/// Index kind requested for a column
///
/// Only equality (hash) indexes exist; `btree` is accepted as an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Hash,
    BTree,
    None,
}

impl IndexKind {
    pub fn is_indexed(&self) -> bool {
        !matches!(self, IndexKind::None)
    }
}

impl FromStr for IndexKind {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hash" => Ok(IndexKind::Hash),
            "btree" => Ok(IndexKind::BTree),
            "none" => Ok(IndexKind::None),
            // Deprecated spellings
            "true" => Ok(IndexKind::Hash),
            "false" => Ok(IndexKind::None),
            _ => Err(TableError::syntax(
                "index must be 'hash', 'btree', 'none' (or deprecated 'true'/'false')",
            )),
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Column data type
    pub col_type: ColumnType,
    /// Whether an equality index is maintained for this column
    pub indexed: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
            indexed: false,
        }
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Parse a `col:type[:index]` column specification.
    pub fn parse(spec: &str) -> Result<Self> {
        let format_error = || TableError::syntax(format!("format: <col:type[:index]>, got '{}'", spec));

        let (name, rest) = spec.split_once(':').ok_or_else(format_error)?;
        if name.is_empty() {
            return Err(format_error());
        }

        let (type_name, index) = match rest.split_once(':') {
            Some((t, i)) => (t, Some(i)),
            None => (rest, None),
        };

        let col_type = type_name.parse::<ColumnType>()?;
        let kind = match index {
            Some(i) => i.parse::<IndexKind>()?,
            None => IndexKind::None,
        };

        Ok(Self {
            name: name.to_string(),
            col_type,
            indexed: kind.is_indexed(),
        })
    }
}

/// Materialized view of a table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Qualified table name
    pub name: TableName,
    /// Column definitions, sorted by name
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(name: TableName, mut columns: Vec<ColumnDef>) -> Self {
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        Self { name, columns }
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}
