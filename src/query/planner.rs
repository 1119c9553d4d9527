//! WHERE clause parsing and query planning

use super::predicate::{type_check, CompareOp, Condition};
use crate::catalog::TableRegistry;
use crate::error::{Result, TableError};
use crate::types::{ColumnType, TableName};

/// Connective joining a condition to the ones before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("AND") {
            Some(Connective::And)
        } else if token.eq_ignore_ascii_case("OR") {
            Some(Connective::Or)
        } else {
            None
        }
    }
}

/// `<cond> ((AND|OR) <cond>)*`, evaluated strictly left to right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub first: Condition,
    pub rest: Vec<(Connective, Condition)>,
}

impl WhereClause {
    pub fn new(first: Condition) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    pub fn and(mut self, cond: Condition) -> Self {
        self.rest.push((Connective::And, cond));
        self
    }

    pub fn or(mut self, cond: Condition) -> Self {
        self.rest.push((Connective::Or, cond));
        self
    }

    /// Parse the tokens following `WHERE`.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let mut iter = tokens.iter().map(AsRef::as_ref);

        let first = iter
            .next()
            .ok_or_else(|| TableError::syntax("WHERE requires at least one condition"))?;
        let mut clause = Self::new(Condition::parse(first)?);

        while let Some(token) = iter.next() {
            let connective = Connective::parse(token).ok_or_else(|| {
                TableError::syntax(format!("expected AND/OR between conditions, got '{}'", token))
            })?;
            let cond = iter
                .next()
                .ok_or_else(|| TableError::syntax("dangling operator"))?;
            clause.rest.push((connective, Condition::parse(cond)?));
        }

        Ok(clause)
    }

    /// All conditions in evaluation order
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, c)| c))
    }
}

/// How a candidate set is produced from scratch
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Every live row of the table
    AllRows,
    /// Members of one equality index set
    IndexLookup { column: String, value: String },
    /// Every live row, filtered by a condition
    Scan {
        condition: Condition,
        col_type: ColumnType,
    },
}

/// One step of an execution plan
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Produce the initial candidate set
    Seed(Access),
    /// Keep only current candidates that satisfy the condition
    Narrow {
        condition: Condition,
        col_type: ColumnType,
    },
    /// Add every row the access path yields
    Union(Access),
}

/// Ordered steps; the first is always a `Seed`
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub steps: Vec<Step>,
}

/// Turns a WHERE clause into an execution plan for one table
pub struct QueryPlanner<'a> {
    registry: &'a TableRegistry,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(registry: &'a TableRegistry) -> Self {
        Self { registry }
    }

    /// Plan a query, validating every condition against the schema first.
    ///
    /// The first condition seeds the candidates, so `=` there needs an index.
    /// Later conditions narrow by filtering (AND) or union a fresh access path
    /// (OR), where an unindexed `=` falls back to a scan.
    pub fn plan(&self, table: &TableName, clause: Option<&WhereClause>) -> Result<ExecutionPlan> {
        self.registry.ensure_table(table)?;

        let Some(clause) = clause else {
            return Ok(ExecutionPlan {
                steps: vec![Step::Seed(Access::AllRows)],
            });
        };

        let types = self.registry.column_types(table)?;
        let indexed = self.registry.indexed_columns(table)?;

        let resolve = |cond: &Condition| -> Result<(ColumnType, bool)> {
            let col_type = *types
                .get(&cond.column)
                .ok_or_else(|| TableError::ColumnNotFound(format!("{} in {}", cond.column, table)))?;
            type_check(&cond.column, col_type, &cond.value)?;
            Ok((col_type, indexed.contains(&cond.column)))
        };

        let access = |cond: &Condition, col_type: ColumnType, is_indexed: bool| {
            if cond.op == CompareOp::Eq && is_indexed {
                Access::IndexLookup {
                    column: cond.column.clone(),
                    value: cond.value.clone(),
                }
            } else {
                Access::Scan {
                    condition: cond.clone(),
                    col_type,
                }
            }
        };

        let mut steps = Vec::with_capacity(clause.rest.len() + 1);

        let (col_type, is_indexed) = resolve(&clause.first)?;
        if clause.first.op == CompareOp::Eq && !is_indexed {
            return Err(TableError::NonIndexedEquality(clause.first.column.clone()));
        }
        steps.push(Step::Seed(access(&clause.first, col_type, is_indexed)));

        for (connective, cond) in &clause.rest {
            let (col_type, is_indexed) = resolve(cond)?;
            steps.push(match connective {
                Connective::And => Step::Narrow {
                    condition: cond.clone(),
                    col_type,
                },
                Connective::Or => Step::Union(access(cond, col_type, is_indexed)),
            });
        }

        Ok(ExecutionPlan { steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::ColumnDef;
    use std::sync::Arc;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_where() {
        let clause = WhereClause::parse(&tokens("a=1 AND b>2 or c<=3")).unwrap();
        assert_eq!(clause.first, Condition::new("a", CompareOp::Eq, "1"));
        assert_eq!(clause.rest.len(), 2);
        assert_eq!(clause.rest[0].0, Connective::And);
        assert_eq!(clause.rest[1].0, Connective::Or);
        assert_eq!(clause.conditions().count(), 3);
    }

    #[test]
    fn test_parse_where_errors() {
        let empty: [&str; 0] = [];
        assert!(matches!(WhereClause::parse(&empty), Err(TableError::Syntax(_))));

        let err = WhereClause::parse(&tokens("a=1 AND")).unwrap_err();
        assert!(err.to_string().contains("dangling operator"));

        let err = WhereClause::parse(&tokens("a=1 b=2")).unwrap_err();
        assert!(err.to_string().contains("expected AND/OR"));

        assert!(matches!(
            WhereClause::parse(&tokens("a AND b=1")),
            Err(TableError::MalformedCondition(_))
        ));
    }

    fn registry() -> (TableRegistry, TableName) {
        let registry = TableRegistry::new(Arc::new(MemoryStore::new()));
        let table = TableName::new("app", "users");
        registry.create_namespace("app").unwrap();
        registry
            .create_table(
                &table,
                &[
                    ColumnDef::new("status", ColumnType::String).indexed(),
                    ColumnDef::new("age", ColumnType::Integer),
                ],
            )
            .unwrap();
        (registry, table)
    }

    #[test]
    fn test_plan_seeds() {
        let (registry, table) = registry();
        let planner = QueryPlanner::new(&registry);

        let plan = planner.plan(&table, None).unwrap();
        assert_eq!(plan.steps, vec![Step::Seed(Access::AllRows)]);

        let clause = WhereClause::parse(&tokens("status=active AND age>30 OR age<5")).unwrap();
        let plan = planner.plan(&table, Some(&clause)).unwrap();
        assert_eq!(plan.steps.len(), 3);
        assert!(matches!(&plan.steps[0], Step::Seed(Access::IndexLookup { column, .. }) if column == "status"));
        assert!(matches!(&plan.steps[1], Step::Narrow { col_type: ColumnType::Integer, .. }));
        assert!(matches!(&plan.steps[2], Step::Union(Access::Scan { .. })));
    }

    #[test]
    fn test_plan_unindexed_equality_after_first() {
        let (registry, table) = registry();
        let planner = QueryPlanner::new(&registry);

        let clause = WhereClause::parse(&tokens("status=a AND age=30")).unwrap();
        let plan = planner.plan(&table, Some(&clause)).unwrap();
        assert_eq!(
            plan.steps[1],
            Step::Narrow {
                condition: Condition::new("age", CompareOp::Eq, "30"),
                col_type: ColumnType::Integer,
            }
        );

        let clause = WhereClause::parse(&tokens("status=a OR age=30")).unwrap();
        let plan = planner.plan(&table, Some(&clause)).unwrap();
        assert!(matches!(
            &plan.steps[1],
            Step::Union(Access::Scan { condition, .. }) if condition.op == CompareOp::Eq
        ));

        // Indexed equality after OR still uses the index
        let clause = WhereClause::parse(&tokens("age>1 OR status=b")).unwrap();
        let plan = planner.plan(&table, Some(&clause)).unwrap();
        assert!(matches!(&plan.steps[1], Step::Union(Access::IndexLookup { value, .. }) if value == "b"));
    }

    #[test]
    fn test_plan_rejects() {
        let (registry, table) = registry();
        let planner = QueryPlanner::new(&registry);

        let plan = |line: &str| {
            let clause = WhereClause::parse(&tokens(line)).unwrap();
            planner.plan(&table, Some(&clause))
        };

        assert!(matches!(plan("age=30"), Err(TableError::NonIndexedEquality(_))));
        assert!(matches!(
            plan("age=30 OR status=a"),
            Err(TableError::NonIndexedEquality(_))
        ));
        assert!(matches!(plan("email>a"), Err(TableError::ColumnNotFound(_))));
        assert!(matches!(plan("age>old"), Err(TableError::TypeMismatch { .. })));

        let missing = TableName::new("app", "nope");
        assert!(matches!(
            planner.plan(&missing, None),
            Err(TableError::TableNotFound(_))
        ));
    }
}
