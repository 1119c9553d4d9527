//! Command layer
//!
//! Dispatches argument vectors such as `["SELECT", "app.users", "WHERE", "age>30"]`
//! to the engine and shapes the results as [`Reply`] values. Command names and
//! keywords are case-insensitive, and the `TABLE.` prefix is optional.
//!
//! # Module Structure
//! - `parse`: tokenizer and `<col>=<value>` parsing
//! - `reply`: reply values and their redis-cli style rendering

mod parse;
mod reply;

pub use parse::{parse_assignment, tokenize};
pub use reply::Reply;

use crate::database::TableEngine;
use crate::error::{Result, TableError};
use crate::query::WhereClause;
use crate::types::{ColumnDef, TableName};
use parse::parse_assignments;
use std::sync::Arc;
use tracing::debug;

/// Command summary returned by `HELP`
pub const HELP_LINES: &[&str] = &[
    "TABLE.NAMESPACE.CREATE <namespace>",
    "TABLE.NAMESPACE.VIEW [<namespace>] - Display all namespace:table pairs, optionally filtered by namespace",
    "TABLE.SCHEMA.VIEW <namespace.table> - Display columns, types, and index status",
    "TABLE.SCHEMA.CREATE <namespace.table> <col:type[:index]> [<col:type[:index]> ...]",
    "  Types: string, integer, float, date (YYYY-MM-DD)",
    "  Index: hash, btree, none (default: none)",
    "  Deprecated: true (=hash), false (=none)",
    "TABLE.SCHEMA.ALTER <namespace.table> ADD COLUMN <col:type[:index]> | ADD INDEX <col> | DROP INDEX <col>",
    "  ADD INDEX builds index for existing data",
    "TABLE.INSERT <namespace.table> <col>=<value> [<col>=<value> ...]",
    "TABLE.SELECT <namespace.table> [WHERE <col><op><value> (AND|OR <col><op><value> ...)]",
    "  Operators: = > < >= <=",
    "  Note: Only indexed columns can use = in WHERE",
    "TABLE.UPDATE <namespace.table> [WHERE <cond> (AND|OR <cond> ...)] SET <col>=<value> [<col>=<value> ...]",
    "TABLE.DELETE <namespace.table> [WHERE <cond> (AND|OR <cond> ...)]",
    "TABLE.DROP <namespace.table> FORCE",
    "  FORCE parameter is required to confirm irreversible deletion",
    "TABLE.HELP",
];

const DROP_WITHOUT_FORCE: &str =
    "This operation is irreversible, use FORCE parameter to remove the table";

const ALTER_SYNTAX: &str = "ADD COLUMN col:type[:index] | ADD INDEX col | DROP INDEX col";

/// Executes table commands against an engine
#[derive(Clone)]
pub struct CommandHandler {
    engine: Arc<TableEngine>,
}

impl CommandHandler {
    pub fn new(engine: Arc<TableEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<TableEngine> {
        &self.engine
    }

    /// Tokenize and execute one command line
    pub fn execute_line(&self, line: &str) -> Result<Reply> {
        self.execute(&tokenize(line)?)
    }

    /// Execute one command given as an argument vector
    pub fn execute<S: AsRef<str>>(&self, argv: &[S]) -> Result<Reply> {
        let argv: Vec<&str> = argv.iter().map(AsRef::as_ref).collect();
        let (name, args) = argv
            .split_first()
            .ok_or_else(|| TableError::syntax("empty command"))?;

        let upper = name.to_ascii_uppercase();
        let command = upper.strip_prefix("TABLE.").unwrap_or(&upper);
        debug!(command, args = args.len(), "executing command");

        match command {
            "NAMESPACE.CREATE" => self.namespace_create(args),
            "NAMESPACE.VIEW" => self.namespace_view(args),
            "SCHEMA.VIEW" => self.schema_view(args),
            "SCHEMA.CREATE" => self.schema_create(args),
            "SCHEMA.ALTER" => self.schema_alter(args),
            "INSERT" => self.insert(args),
            "SELECT" => self.select(args),
            "UPDATE" => self.update(args),
            "DELETE" => self.delete(args),
            "DROP" => self.drop(args),
            "HELP" => Ok(Reply::strings(HELP_LINES.iter().copied())),
            _ => Err(TableError::syntax(format!("unknown command '{}'", name))),
        }
    }

    // ==================== Catalog ====================

    fn namespace_create(&self, args: &[&str]) -> Result<Reply> {
        let [namespace] = args else {
            return Err(arity("NAMESPACE.CREATE"));
        };
        self.engine.create_namespace(namespace)?;
        Ok(Reply::Ok)
    }

    fn namespace_view(&self, args: &[&str]) -> Result<Reply> {
        let filter = match args {
            [] => None,
            [namespace] => Some(*namespace),
            _ => return Err(arity("NAMESPACE.VIEW")),
        };
        let tables = self.engine.list_tables(filter)?;
        Ok(Reply::strings(
            tables
                .iter()
                .map(|t| format!("{}:{}", t.namespace(), t.table())),
        ))
    }

    fn schema_view(&self, args: &[&str]) -> Result<Reply> {
        let [table] = args else {
            return Err(arity("SCHEMA.VIEW"));
        };
        let schema = self.engine.describe_table(&TableName::parse(table)?)?;
        Ok(Reply::Array(
            schema
                .columns
                .iter()
                .map(|c| {
                    Reply::strings([
                        c.name.as_str(),
                        c.col_type.as_str(),
                        if c.indexed { "true" } else { "false" },
                    ])
                })
                .collect(),
        ))
    }

    fn schema_create(&self, args: &[&str]) -> Result<Reply> {
        let [table, specs @ ..] = args else {
            return Err(arity("SCHEMA.CREATE"));
        };
        if specs.is_empty() {
            return Err(arity("SCHEMA.CREATE"));
        }

        let table = TableName::parse(table)?;
        let columns = specs
            .iter()
            .map(|s| ColumnDef::parse(s))
            .collect::<Result<Vec<_>>>()?;
        self.engine.create_table(&table, &columns)?;
        Ok(Reply::Ok)
    }

    fn schema_alter(&self, args: &[&str]) -> Result<Reply> {
        let [table, action, target, operand] = args else {
            return Err(TableError::syntax(ALTER_SYNTAX));
        };
        let table = TableName::parse(table)?;

        let action = action.to_ascii_uppercase();
        let target = target.to_ascii_uppercase();
        match (action.as_str(), target.as_str()) {
            ("ADD", "COLUMN") => {
                self.engine.add_column(&table, &ColumnDef::parse(operand)?)?;
            }
            ("ADD", "INDEX") => {
                self.engine.add_index(&table, operand)?;
            }
            ("DROP", "INDEX") => {
                self.engine.drop_index(&table, operand)?;
            }
            _ => return Err(TableError::syntax(ALTER_SYNTAX)),
        }
        Ok(Reply::Ok)
    }

    // ==================== Rows ====================

    fn insert(&self, args: &[&str]) -> Result<Reply> {
        let [table, fields @ ..] = args else {
            return Err(arity("INSERT"));
        };
        if fields.is_empty() {
            return Err(arity("INSERT"));
        }

        let table = TableName::parse(table)?;
        let fields = parse_assignments(fields)?;
        let id = self.engine.insert_row(&table, &fields)?;
        Ok(Reply::Bulk(id.to_string()))
    }

    fn select(&self, args: &[&str]) -> Result<Reply> {
        let [table, rest @ ..] = args else {
            return Err(arity("SELECT"));
        };
        let table = TableName::parse(table)?;
        let clause = parse_where(rest)?;

        let rows = self.engine.select(&table, clause.as_ref())?;
        Ok(Reply::Array(
            rows.iter().map(|row| Reply::strings(row.flatten())).collect(),
        ))
    }

    fn update(&self, args: &[&str]) -> Result<Reply> {
        let [table, rest @ ..] = args else {
            return Err(arity("UPDATE"));
        };
        let table = TableName::parse(table)?;

        let set = rest
            .iter()
            .position(|t| t.eq_ignore_ascii_case("SET"))
            .ok_or_else(|| TableError::syntax("missing SET"))?;
        let clause = parse_where(&rest[..set])?;
        let assignments = &rest[set + 1..];
        if assignments.is_empty() {
            return Err(TableError::syntax("SET expects <col>=<value>"));
        }
        let assignments = parse_assignments(assignments)?;

        let updated = self.engine.update(&table, clause.as_ref(), &assignments)?;
        Ok(Reply::Integer(updated as i64))
    }

    fn delete(&self, args: &[&str]) -> Result<Reply> {
        let [table, rest @ ..] = args else {
            return Err(arity("DELETE"));
        };
        let table = TableName::parse(table)?;
        let clause = parse_where(rest)?;

        let deleted = self.engine.delete(&table, clause.as_ref())?;
        Ok(Reply::Integer(deleted as i64))
    }

    fn drop(&self, args: &[&str]) -> Result<Reply> {
        let table = match args {
            [table, force] if force.eq_ignore_ascii_case("FORCE") => table,
            [_] | [_, _] => return Err(TableError::syntax(DROP_WITHOUT_FORCE)),
            _ => return Err(arity("DROP")),
        };
        self.engine.drop_table(&TableName::parse(table)?)?;
        Ok(Reply::Ok)
    }
}

fn arity(command: &str) -> TableError {
    TableError::syntax(format!("wrong number of arguments for '{}'", command))
}

/// `[]` or `["WHERE", cond, ...]`
fn parse_where(tokens: &[&str]) -> Result<Option<WhereClause>> {
    match tokens.split_first() {
        None => Ok(None),
        Some((keyword, conditions)) if keyword.eq_ignore_ascii_case("WHERE") => {
            WhereClause::parse(conditions).map(Some)
        }
        Some((other, _)) => Err(TableError::syntax(format!("expected WHERE, got '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn handler() -> CommandHandler {
        CommandHandler::new(Arc::new(TableEngine::in_memory(EngineConfig::for_testing())))
    }

    #[test]
    fn test_prefix_and_case() {
        let h = handler();
        assert_eq!(h.execute_line("table.namespace.create app").unwrap(), Reply::Ok);
        assert_eq!(
            h.execute_line("SCHEMA.CREATE app.t name:string").unwrap(),
            Reply::Ok
        );
        assert_eq!(
            h.execute_line("Table.Namespace.View").unwrap(),
            Reply::strings(["app:t"])
        );
    }

    #[test]
    fn test_help() {
        let reply = handler().execute(&["HELP"]).unwrap();
        assert_eq!(reply.as_array().unwrap().len(), HELP_LINES.len());
    }

    #[test]
    fn test_syntax_errors() {
        let h = handler();
        h.execute_line("NAMESPACE.CREATE app").unwrap();
        h.execute_line("SCHEMA.CREATE app.t a:integer").unwrap();

        let syntax = |line: &str| matches!(h.execute_line(line), Err(TableError::Syntax(_)));
        assert!(syntax("NAMESPACE.CREATE"));
        assert!(syntax("SCHEMA.CREATE app.t"));
        assert!(syntax("INSERT app.t"));
        assert!(syntax("SELECT app.t a>1"));
        assert!(syntax("SELECT app.t WHERE"));
        assert!(syntax("UPDATE app.t WHERE a>1"));
        assert!(syntax("UPDATE app.t SET"));
        assert!(syntax("INSERT app.t a"));
        assert!(syntax("SCHEMA.ALTER app.t RENAME COLUMN a"));
        assert!(syntax("DROP app.t"));
        assert!(syntax("DROP app.t NOW"));
        assert!(syntax("FROB app.t"));
        assert!(h.execute::<&str>(&[]).is_err());

        let err = h.execute_line("DROP app.t").unwrap_err();
        assert!(err.to_string().contains("use FORCE parameter"));
    }

    #[test]
    fn test_schema_view() {
        let h = handler();
        h.execute_line("NAMESPACE.CREATE app").unwrap();
        h.execute_line("SCHEMA.CREATE app.t name:string age:integer:hash").unwrap();

        let reply = h.execute_line("SCHEMA.VIEW app.t").unwrap();
        assert_eq!(
            reply,
            Reply::Array(vec![
                Reply::strings(["age", "integer", "true"]),
                Reply::strings(["name", "string", "false"]),
            ])
        );
    }
}
