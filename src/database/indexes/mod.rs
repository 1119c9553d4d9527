//! Index Operations Module
//!
//! - column: Equality indexes for WHERE `=` conditions

pub mod column;

// Re-export for convenience
pub use column::{DropIndexReport, IndexTeardown};
