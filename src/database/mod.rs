//! Engine Module
//!
//! # Module Structure
//! - `core`: TableEngine struct and constructors
//! - `crud`: Row store and SELECT/UPDATE/DELETE
//! - `table`: Namespace and table management (create/describe/list/drop)
//! - `indexes`: Equality index maintenance (add/drop/update)

pub mod core;
pub mod crud;
pub mod indexes;
pub mod table;

// Re-export main types
pub use self::core::TableEngine;
pub use indexes::{DropIndexReport, IndexTeardown};
