//! In-memory key-value store
//!
//! Reference implementation of [`KvStore`]. Keys live in an ordered map behind a
//! single `parking_lot::RwLock`, so every primitive is atomic and scans can
//! resume from the last key they visited.
//!
//! Like the stores this engine was designed for, empty hashes and sets are
//! removed as soon as their last element goes away.

use super::pattern;
use super::{KeyType, KvStore, ScanCursor, ScanPage};
use crate::error::{Result, TableError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Value stored under one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Entry {
    Str(String),
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
}

impl Entry {
    fn key_type(&self) -> KeyType {
        match self {
            Entry::Str(_) => KeyType::String,
            Entry::Hash(_) => KeyType::Hash,
            Entry::Set(_) => KeyType::Set,
        }
    }
}

fn wrong_type(key: &str) -> TableError {
    TableError::Store(format!(
        "WRONGTYPE operation against a key holding the wrong kind of value: {}",
        key
    ))
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: BTreeMap<String, Entry>) -> Self {
        Self {
            data: RwLock::new(entries),
        }
    }

    pub(crate) fn entries(&self) -> Vec<(String, Entry)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// All keys in order (test and debugging helper; not bounded)
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }
}

impl KvStore for MemoryStore {
    fn key_type(&self, key: &str) -> Result<KeyType> {
        Ok(self
            .data
            .read()
            .get(key)
            .map_or(KeyType::Empty, Entry::key_type))
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.data.read().get(key) {
            None => Ok(None),
            Some(Entry::Str(v)) => Ok(Some(v.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .insert(key.to_string(), Entry::Str(value.to_string()));
        Ok(())
    }

    fn del(&self, key: &str) -> Result<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    fn incr(&self, key: &str) -> Result<i64> {
        let mut data = self.data.write();
        let current = match data.get(key) {
            None => 0,
            Some(Entry::Str(v)) => v.parse::<i64>().map_err(|_| {
                TableError::Store(format!("value is not an integer or out of range: {}", key))
            })?,
            Some(_) => return Err(wrong_type(key)),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| TableError::Store(format!("increment would overflow: {}", key)))?;
        data.insert(key.to_string(), Entry::Str(next.to_string()));
        Ok(next)
    }

    fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        match self.data.read().get(key) {
            None => Ok(None),
            Some(Entry::Hash(h)) => Ok(h.get(field).cloned()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        let mut data = self.data.write();
        let entry = data
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(BTreeMap::new()));
        match entry {
            Entry::Hash(h) => Ok(h.insert(field.to_string(), value.to_string()).is_none()),
            _ => Err(wrong_type(key)),
        }
    }

    fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let mut data = self.data.write();
        let (removed, now_empty) = match data.get_mut(key) {
            None => return Ok(false),
            Some(Entry::Hash(h)) => (h.remove(field).is_some(), h.is_empty()),
            Some(_) => return Err(wrong_type(key)),
        };
        if now_empty {
            data.remove(key);
        }
        Ok(removed)
    }

    fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>> {
        match self.data.read().get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Hash(h)) => Ok(h.iter().map(|(f, v)| (f.clone(), v.clone())).collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut data = self.data.write();
        let entry = data
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()));
        match entry {
            Entry::Set(s) => Ok(s.insert(member.to_string())),
            _ => Err(wrong_type(key)),
        }
    }

    fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut data = self.data.write();
        let (removed, now_empty) = match data.get_mut(key) {
            None => return Ok(false),
            Some(Entry::Set(s)) => (s.remove(member), s.is_empty()),
            Some(_) => return Err(wrong_type(key)),
        };
        if now_empty {
            data.remove(key);
        }
        Ok(removed)
    }

    fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        match self.data.read().get(key) {
            None => Ok(false),
            Some(Entry::Set(s)) => Ok(s.contains(member)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        match self.data.read().get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(s)) => Ok(s.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn scan(&self, cursor: &ScanCursor, pattern: &str, count: usize) -> Result<ScanPage> {
        let lower = match cursor {
            ScanCursor::Start => Bound::Unbounded,
            ScanCursor::After(last) => Bound::Excluded(last.as_str()),
            ScanCursor::Done => {
                return Ok(ScanPage {
                    keys: Vec::new(),
                    cursor: ScanCursor::Done,
                })
            }
        };

        let budget = count.max(1);
        let data = self.data.read();
        let mut keys = Vec::new();
        let mut visited = 0usize;
        let mut last: Option<&String> = None;

        for (key, _) in data.range::<str, _>((lower, Bound::Unbounded)) {
            visited += 1;
            last = Some(key);
            if pattern::matches(pattern, key) {
                keys.push(key.clone());
            }
            if visited == budget {
                break;
            }
        }

        // A short page means the range ran out
        let cursor = match last {
            Some(key) if visited == budget => ScanCursor::After(key.clone()),
            _ => ScanCursor::Done,
        };

        Ok(ScanPage { keys, cursor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(store: &MemoryStore, pattern: &str, count: usize) -> (Vec<String>, usize) {
        let mut cursor = ScanCursor::Start;
        let mut keys = Vec::new();
        let mut calls = 0;
        loop {
            let page = store.scan(&cursor, pattern, count).unwrap();
            calls += 1;
            keys.extend(page.keys);
            if page.cursor.is_done() {
                break;
            }
            cursor = page.cursor;
        }
        (keys, calls)
    }

    #[test]
    fn test_scalars_and_incr() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("counter").unwrap(), 1);
        assert_eq!(store.incr("counter").unwrap(), 2);
        assert_eq!(store.get("counter").unwrap().as_deref(), Some("2"));
        assert_eq!(store.key_type("counter").unwrap(), KeyType::String);

        store.set("word", "abc").unwrap();
        assert!(store.incr("word").is_err());
        assert!(store.del("word").unwrap());
        assert!(!store.del("word").unwrap());
    }

    #[test]
    fn test_empty_collections_vanish() {
        let store = MemoryStore::new();
        store.sadd("s", "1").unwrap();
        store.hset("h", "f", "v").unwrap();
        assert_eq!(store.key_type("s").unwrap(), KeyType::Set);
        assert_eq!(store.key_type("h").unwrap(), KeyType::Hash);

        assert!(store.srem("s", "1").unwrap());
        assert!(store.hdel("h", "f").unwrap());
        assert_eq!(store.key_type("s").unwrap(), KeyType::Empty);
        assert_eq!(store.key_type("h").unwrap(), KeyType::Empty);
        assert!(store.is_empty());
    }

    #[test]
    fn test_wrong_type() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert!(matches!(store.sadd("k", "x"), Err(TableError::Store(_))));
        assert!(matches!(store.hget("k", "x"), Err(TableError::Store(_))));
    }

    #[test]
    fn test_scan_pages() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store.set(&format!("key:{:02}", i), "x").unwrap();
        }
        store.set("other", "x").unwrap();

        let (keys, calls) = drain(&store, "key:*", 10);
        assert_eq!(keys.len(), 25);
        assert!(calls >= 3);
    }

    #[test]
    fn test_scan_survives_deletes() {
        let store = MemoryStore::new();
        for i in 0..9 {
            store.sadd(&format!("idx:{}", i), "1").unwrap();
        }

        let mut cursor = ScanCursor::Start;
        let mut deleted = 0;
        while !cursor.is_done() {
            let page = store.scan(&cursor, "idx:*", 2).unwrap();
            for key in &page.keys {
                store.del(key).unwrap();
                deleted += 1;
            }
            cursor = page.cursor;
        }

        assert_eq!(deleted, 9);
        assert!(store.is_empty());
    }
}
