use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::time::Instant;

use crate::storage::types::KvEntry;

#[derive(Debug, Default)]
pub struct Shard {
    map: RwLock<HashMap<String, KvEntry>>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a live entry, dropping it first if it has already expired.
    pub fn get(&self, key: &str, now: Instant) -> Option<KvEntry> {
        {
            let map = self.map.read();
            match map.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.purge_if_expired(key, now);
        None
    }

    /// Runs `f` under the shard's write lock on the live slot for `key`.
    /// Expired entries are presented as vacant.
    pub fn update<R>(&self, key: &str, now: Instant, f: impl FnOnce(&mut Option<KvEntry>) -> R) -> R {
        let mut map = self.map.write();
        let mut slot = match map.remove(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry),
            _ => None,
        };
        let result = f(&mut slot);
        if let Some(entry) = slot {
            map.insert(key.to_string(), entry);
        }
        result
    }

    pub fn del(&self, key: &str, now: Instant) -> Option<KvEntry> {
        let mut map = self.map.write();
        map.remove(key).filter(|entry| !entry.is_expired(now))
    }

    /// Removes `key` only if it is expired at `now`; a refreshed entry survives.
    pub fn purge_if_expired(&self, key: &str, now: Instant) -> bool {
        let mut map = self.map.write();
        if map.get(key).map_or(false, |entry| entry.is_expired(now)) {
            map.remove(key);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        let map = self.map.read();
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
