//! MemoryStore snapshots
//!
//! File layout:
//! ```text
//! [magic: 4 bytes "KVTB"][version: u32 LE][crc32: u32 LE][bincode payload]
//! ```
//! The checksum covers the payload only.

use super::memory::{Entry, MemoryStore};
use crate::error::{Result, TableError};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

const MAGIC: &[u8; 4] = b"KVTB";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 12;

impl MemoryStore {
    /// Write every key to `path`, replacing the file atomically.
    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let entries = self.entries();
        let payload = bincode::serialize(&entries)?;

        let mut data = Vec::with_capacity(HEADER_LEN + payload.len());
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        data.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        data.extend_from_slice(&payload);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, path)?;

        info!(path = %path.display(), keys = entries.len(), "snapshot saved");
        Ok(())
    }

    /// Rebuild a store from a snapshot written by [`MemoryStore::save_snapshot`].
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;

        if data.len() < HEADER_LEN || &data[0..4] != MAGIC {
            return Err(TableError::Snapshot(format!(
                "not a kvtable snapshot: {}",
                path.display()
            )));
        }

        let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if version != FORMAT_VERSION {
            return Err(TableError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let expected = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        let payload = &data[HEADER_LEN..];
        let actual = crc32fast::hash(payload);
        if actual != expected {
            return Err(TableError::Snapshot(format!(
                "checksum mismatch: expected {:08x}, got {:08x}",
                expected, actual
            )));
        }

        let entries: Vec<(String, Entry)> = bincode::deserialize(payload)?;
        let count = entries.len();
        let store = MemoryStore::from_entries(entries.into_iter().collect::<BTreeMap<_, _>>());

        info!(path = %path.display(), keys = count, "snapshot loaded");
        Ok(store)
    }
}
