//! Catalog: namespaces, table schemas, column types and index flags
//!
//! Schema objects are stored in the key-value store itself; see [`keys`] for the
//! layout.

pub mod keys;
mod registry;

pub use keys::TableKeys;
pub use registry::TableRegistry;
