//! kvtable Query Engine
//!
//! Relational-style tables on top of a key-value store: namespaces, typed
//! columns, equality indexes, CRUD and WHERE clauses with AND/OR.
//!
//! ## Architecture
//! - Store layer: `KvStore` capability (scalars, hashes, sets, paged scan) + `MemoryStore`
//! - Catalog: namespaces and table schemas persisted as store keys
//! - Index layer: per-value row id sets, answering `=` only
//! - Query layer: seed / narrow / union planning with a bounded filter scan
//! - Command layer: argument-vector commands with server-style replies
//!
//! ## Example
//! ```ignore
//! use kvtable::{CommandHandler, EngineConfig, TableEngine};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(TableEngine::in_memory(EngineConfig::default()));
//! let handler = CommandHandler::new(engine);
//! handler.execute_line("NAMESPACE.CREATE app")?;
//! handler.execute_line("SCHEMA.CREATE app.users name:string status:string:hash")?;
//! handler.execute_line("INSERT app.users name=ada status=active")?;
//! let rows = handler.execute_line("SELECT app.users WHERE status=active")?;
//! ```

pub mod catalog;
pub mod command;
pub mod config;
pub mod database;
pub mod query;
pub mod scan;
pub mod store;
pub mod types;

mod error;

pub use config::EngineConfig;
pub use error::{Result, TableError};

// Main API
pub use catalog::TableRegistry;
pub use command::{CommandHandler, Reply};
pub use database::{DropIndexReport, IndexTeardown, TableEngine};
pub use query::{CompareOp, Condition, WhereClause};
pub use store::{KvStore, MemoryStore};
pub use types::{ColumnDef, ColumnType, Row, RowId, TableName, TableSchema};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
