//! Query layer
//!
//! # Module Structure
//! - `predicate`: single conditions, operators and typed comparison
//! - `planner`: WHERE clause parsing and seed/narrow/union planning
//! - `executor`: runs a plan against the store under the scan limit

mod executor;
mod planner;
mod predicate;

pub use executor::QueryExecutor;
pub use planner::{Access, Connective, ExecutionPlan, QueryPlanner, Step, WhereClause};
pub use predicate::{type_check, CompareOp, Condition};
