//! Data types shared by the catalog, row store and query layers

mod name;
mod table;

pub use name::{TableName, MAX_NAME_LEN};
pub(crate) use name::validate_name;
pub use table::{ColumnDef, ColumnType, IndexKind, TableSchema};

/// Table-scoped row identifier (allocated from 1, never reused)
pub type RowId = u64;

/// A stored row: its id and its `column -> value` fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: RowId,
    /// Fields sorted by column name
    pub fields: Vec<(String, String)>,
}

impl Row {
    pub fn new(id: RowId, mut fields: Vec<(String, String)>) -> Self {
        fields.sort();
        Self { id, fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Flat `[col1, val1, col2, val2, ...]` encoding
    pub fn flatten(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(c, v)| [c.clone(), v.clone()])
            .collect()
    }
}
