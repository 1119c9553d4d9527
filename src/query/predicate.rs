//! Conditions: `<column><op><value>` with typed comparison

use crate::error::{Result, TableError};
use crate::types::ColumnType;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::GtEq => ">=",
            CompareOp::LtEq => "<=",
        }
    }

    /// Whether `stored <op> operand` holds, given `stored.cmp(operand)`
    pub fn evaluate(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::GtEq => ordering != Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single WHERE condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: String,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Split `text` at its operator.
    ///
    /// The first `>=` or `<=` wins; failing that, the first of `=`, `>`, `<`.
    /// The column and the value must both be non-empty.
    pub fn parse(text: &str) -> Result<Self> {
        let two_char = [(">=", CompareOp::GtEq), ("<=", CompareOp::LtEq)]
            .into_iter()
            .filter_map(|(sym, op)| text.find(sym).map(|pos| (pos, sym.len(), op)))
            .min_by_key(|(pos, _, _)| *pos);

        let found = two_char.or_else(|| {
            text.char_indices().find_map(|(pos, c)| match c {
                '=' => Some((pos, 1, CompareOp::Eq)),
                '>' => Some((pos, 1, CompareOp::Gt)),
                '<' => Some((pos, 1, CompareOp::Lt)),
                _ => None,
            })
        });

        let (pos, len, op) = found.ok_or_else(|| TableError::MalformedCondition(text.to_string()))?;
        let column = &text[..pos];
        let value = &text[pos + len..];
        if column.is_empty() || value.is_empty() {
            return Err(TableError::MalformedCondition(text.to_string()));
        }

        Ok(Self::new(column, op, value))
    }

    /// Test a stored value against this condition.
    ///
    /// Values that cannot be interpreted as `col_type` never match.
    pub fn matches(&self, stored: &str, col_type: ColumnType) -> bool {
        col_type
            .compare(stored, &self.value)
            .map_or(false, |ordering| self.op.evaluate(ordering))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.column, self.op, self.value)
    }
}

/// Validate `value` for a column of type `col_type`.
pub fn type_check(column: &str, col_type: ColumnType, value: &str) -> Result<()> {
    if col_type.validate(value) {
        Ok(())
    } else {
        Err(TableError::TypeMismatch {
            column: column.to_string(),
            expected: col_type.as_str(),
            value: value.to_string(),
        })
    }
}
