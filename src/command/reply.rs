//! Command replies

use std::fmt;

/// Reply of a table command, shaped like a key-value server reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Integer(i64),
    Bulk(String),
    Array(Vec<Reply>),
}

impl Reply {
    pub fn bulk(s: impl Into<String>) -> Self {
        Reply::Bulk(s.into())
    }

    /// Array of bulk strings
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Reply::Array(items.into_iter().map(|s| Reply::Bulk(s.into())).collect())
    }

    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Bulk(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(s) => write!(f, "{:?}", s),
            Reply::Array(items) if items.is_empty() => f.write_str("(empty array)"),
            Reply::Array(items) => {
                let width = items.len().to_string().len();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                        write!(f, "{:indent$}", "", indent = indent)?;
                    }
                    write!(f, "{:>width$}) ", i + 1, width = width)?;
                    item.fmt_indented(f, indent + width + 2)?;
                }
                Ok(())
            }
        }
    }
}

/// redis-cli style rendering: numbered, nested arrays indented
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
