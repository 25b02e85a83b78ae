//! Persistent token address cache
//!
//! A JSON file mapping `chain -> network -> SYMBOL -> address`. A `null` or
//! empty-string entry means "unresolved" and is reported as absent.

use super::ResolveError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type CacheMap = HashMap<String, HashMap<String, HashMap<String, Option<String>>>>;

/// File-backed cache of resolved contract addresses
pub struct AddressCache {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl AddressCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<CacheMap, ResolveError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| ResolveError::Cache(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CacheMap::new()),
            Err(e) => Err(ResolveError::Cache(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_map(&self, map: &CacheMap) -> Result<(), ResolveError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| ResolveError::Cache(format!("{}: {e}", parent.display())))?;
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| ResolveError::Cache(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| ResolveError::Cache(format!("{}: {e}", self.path.display())))
    }

    /// Look up a cached address. Absent, `null`, and empty-string entries all
    /// resolve to `None`.
    pub fn get(
        &self,
        chain: &str,
        network: &str,
        symbol: &str,
    ) -> Result<Option<String>, ResolveError> {
        let _guard = self.lock.lock().expect("cache lock poisoned");
        let map = self.read_map()?;
        let entry = map
            .get(chain)
            .and_then(|networks| networks.get(network))
            .and_then(|symbols| symbols.get(symbol))
            .and_then(|address| address.clone());
        Ok(entry.filter(|address| !address.is_empty()))
    }

    /// Persist a resolved address.
    pub fn put(
        &self,
        chain: &str,
        network: &str,
        symbol: &str,
        address: &str,
    ) -> Result<(), ResolveError> {
        let _guard = self.lock.lock().expect("cache lock poisoned");
        let mut map = self.read_map()?;
        map.entry(chain.to_string())
            .or_default()
            .entry(network.to_string())
            .or_default()
            .insert(symbol.to_string(), Some(address.to_string()));
        self.write_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ADDRESS: &str = "0x0E09FaBB73Bd3Ade0a17ECC321fD13a19e81cE82";

    fn cache_in(dir: &TempDir) -> AddressCache {
        AddressCache::new(dir.path().join("addresses.json"))
    }

    #[test]
    fn test_missing_file_is_empty_cache() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        assert!(cache.get("bsc", "mainnet", "CAKE").unwrap().is_none());
    }

    #[test]
    fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        cache.put("bsc", "mainnet", "CAKE", ADDRESS).unwrap();
        assert_eq!(
            cache.get("bsc", "mainnet", "CAKE").unwrap().as_deref(),
            Some(ADDRESS)
        );
        // Different network is a separate namespace
        assert!(cache.get("bsc", "testnet", "CAKE").unwrap().is_none());
    }

    #[test]
    fn test_null_entry_reported_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("addresses.json");
        std::fs::write(&path, r#"{"bsc":{"mainnet":{"CAKE":null}}}"#).unwrap();
        let cache = AddressCache::new(&path);
        assert!(cache.get("bsc", "mainnet", "CAKE").unwrap().is_none());
    }

    #[test]
    fn test_empty_string_normalized_to_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("addresses.json");
        std::fs::write(&path, r#"{"bsc":{"mainnet":{"CAKE":""}}}"#).unwrap();
        let cache = AddressCache::new(&path);
        assert!(cache.get("bsc", "mainnet", "CAKE").unwrap().is_none());
    }

    #[test]
    fn test_put_preserves_other_entries() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        cache.put("bsc", "mainnet", "CAKE", ADDRESS).unwrap();
        cache.put("bsc", "mainnet", "WBNB", "0xbb4C").unwrap();
        assert_eq!(
            cache.get("bsc", "mainnet", "CAKE").unwrap().as_deref(),
            Some(ADDRESS)
        );
        assert_eq!(
            cache.get("bsc", "mainnet", "WBNB").unwrap().as_deref(),
            Some("0xbb4C")
        );
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("addresses.json");
        std::fs::write(&path, "not json").unwrap();
        let cache = AddressCache::new(&path);
        assert!(matches!(
            cache.get("bsc", "mainnet", "CAKE"),
            Err(ResolveError::Cache(_))
        ));
    }
}
