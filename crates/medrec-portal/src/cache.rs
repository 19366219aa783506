//! Non-authoritative cache of a doctor's own created-record ids.
//!
//! One JSON file per account. The contract's per-doctor query is always
//! the source of truth; this cache only backs the display when that
//! query fails. Cache failures are logged and swallowed; losing the
//! cache costs nothing.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use medrec_core::Address;

pub struct RecordCache {
    dir: PathBuf,
}

impl RecordCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        RecordCache { dir: dir.into() }
    }

    fn path_for(&self, account: Address) -> PathBuf {
        self.dir.join(format!("records-{}.json", account.to_hex_lower()))
    }

    pub fn load(&self, account: Address) -> Vec<u64> {
        let path = self.path_for(account);
        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(ids) => ids,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "discarding unreadable record cache");
                    Vec::new()
                }
            },
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no record cache");
                Vec::new()
            }
        }
    }

    /// Append `id` for `account` unless it is already present.
    pub fn remember(&self, account: Address, id: u64) {
        let mut ids = self.load(account);
        if ids.contains(&id) {
            return;
        }
        ids.push(id);
        if let Err(err) = self.store(account, &ids) {
            warn!(error = %err, "record cache write failed");
        }
    }

    fn store(&self, account: Address, ids: &[u64]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let body = serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string());
        fs::write(self.path_for(account), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(tag: &str) -> RecordCache {
        let dir = std::env::temp_dir().join(format!(
            "medrec-cache-test-{}-{tag}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        RecordCache::new(dir)
    }

    fn addr(tail: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = tail;
        Address::from_bytes(bytes)
    }

    #[test]
    fn round_trips_ids_per_account() {
        let cache = temp_cache("roundtrip");
        cache.remember(addr(1), 3);
        cache.remember(addr(1), 7);
        cache.remember(addr(1), 3); // duplicate ignored
        cache.remember(addr(2), 9);

        assert_eq!(cache.load(addr(1)), vec![3, 7]);
        assert_eq!(cache.load(addr(2)), vec![9]);
    }

    #[test]
    fn missing_cache_is_empty_not_fatal() {
        let cache = temp_cache("missing");
        assert!(cache.load(addr(5)).is_empty());
    }

    #[test]
    fn corrupt_cache_is_discarded() {
        let cache = temp_cache("corrupt");
        cache.remember(addr(1), 1);
        fs::write(cache.path_for(addr(1)), "not json").unwrap();
        assert!(cache.load(addr(1)).is_empty());
    }
}
