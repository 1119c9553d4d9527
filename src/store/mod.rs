//! Key-value store capability
//!
//! The engine never owns data. Everything lives in a store that offers
//! scalar, hash and set primitives plus a paged key scan. Each primitive is
//! atomic on its own; there is no multi-call transaction.
//!
//! # Module Structure
//! - `memory`: in-process `MemoryStore` (reference implementation)
//! - `pattern`: glob matching and escaping used by `scan`
//! - `snapshot`: checksummed on-disk snapshots of a `MemoryStore`

pub mod memory;
pub mod pattern;
mod snapshot;

pub use memory::MemoryStore;

use crate::error::Result;

/// Kind of value held at a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Empty,
    String,
    Hash,
    Set,
}

/// Continuation token of a paged key scan
///
/// `Start` begins a scan, `Done` is the completion sentinel. `After` is the
/// position of the last key visited; stores that cannot resume by key may
/// encode any opaque position in it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanCursor {
    #[default]
    Start,
    After(String),
    Done,
}

impl ScanCursor {
    pub fn is_done(&self) -> bool {
        matches!(self, ScanCursor::Done)
    }
}

/// One page of a key scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    /// Keys on this page that matched the pattern (may be empty)
    pub keys: Vec<String>,
    /// Where to continue; `ScanCursor::Done` once the keyspace is exhausted
    pub cursor: ScanCursor,
}

/// Primitive operations the table engine needs from a store
pub trait KvStore: Send + Sync {
    fn key_type(&self, key: &str) -> Result<KeyType>;

    // ==================== Scalars ====================

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key of any type. Returns whether it existed.
    fn del(&self, key: &str) -> Result<bool>;

    /// Atomically increment an integer scalar (missing keys start at 0).
    fn incr(&self, key: &str) -> Result<i64>;

    // ==================== Hashes ====================

    fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Returns true if the field was newly created.
    fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool>;

    fn hdel(&self, key: &str, field: &str) -> Result<bool>;

    fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>>;

    fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.hgetall(key)?.into_iter().map(|(field, _)| field).collect())
    }

    // ==================== Sets ====================

    /// Returns true if the member was added.
    fn sadd(&self, key: &str, member: &str) -> Result<bool>;

    /// Returns true if the member was present.
    fn srem(&self, key: &str, member: &str) -> Result<bool>;

    fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    fn smembers(&self, key: &str) -> Result<Vec<String>>;

    // ==================== Keyspace ====================

    /// Visit at most `count` keys starting at `cursor` and return those matching
    /// the glob `pattern`. Never does more than one bounded page of work.
    fn scan(&self, cursor: &ScanCursor, pattern: &str, count: usize) -> Result<ScanPage>;
}
