//! Pagination cache with an all-or-nothing startup invalidation policy.
//!
//! Layout payloads are expensive to recompute, so they are memoized on disk
//! keyed by content hash plus every rendering parameter that affects the
//! result. The startup check compares one persisted `(buildVersion,
//! contentHash)` stamp against the current pair; on any mismatch every entry
//! is evicted before the first read. Coarse, but a content or build change
//! can never silently serve stale pagination for an unrelated book.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

const STAMP_FILE: &str = "stamp.json";
const ENTRIES_DIR: &str = "entries";
const DEFAULT_CAPACITY: usize = 64;

/// Every parameter that changes the layout result is part of the key.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    pub book_id: String,
    pub content_hash: String,
    pub font_scale: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub theme_id: String,
    pub build_version: String,
}

impl CacheKey {
    fn as_string(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.book_id,
            self.content_hash,
            self.font_scale,
            self.viewport_width,
            self.viewport_height,
            self.theme_id,
            self.build_version
        )
    }

    fn file_name(&self) -> String {
        let digest = hex::encode(Sha256::digest(self.as_string().as_bytes()));
        format!("{}.json", &digest[..16])
    }
}

/// The persisted pair the startup check compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStamp {
    pub build_version: String,
    pub content_hash: String,
}

/// Disk-backed pagination cache with an in-memory LRU layer in front.
/// Payloads are opaque JSON; the layout engine that produces them lives
/// outside this crate.
pub struct PaginationCache {
    dir: PathBuf,
    memory: Mutex<LruCache<String, Arc<serde_json::Value>>>,
}

impl PaginationCache {
    /// Open the cache directory and run the startup check: any stamp
    /// mismatch evicts all entries before the first read, then the new stamp
    /// is persisted.
    pub fn open(dir: &Path, current: &CacheStamp) -> Result<Self> {
        Self::with_capacity(dir, current, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(dir: &Path, current: &CacheStamp, capacity: usize) -> Result<Self> {
        fs::create_dir_all(dir.join(ENTRIES_DIR))
            .with_context(|| format!("cannot create cache dir {:?}", dir))?;

        let stamp_path = dir.join(STAMP_FILE);
        let persisted: Option<CacheStamp> = fs::read_to_string(&stamp_path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok());

        if persisted.as_ref() != Some(current) {
            info!(
                "pagination cache stamp mismatch (had {:?}), evicting all entries",
                persisted
            );
            fs::remove_dir_all(dir.join(ENTRIES_DIR)).ok();
            fs::create_dir_all(dir.join(ENTRIES_DIR))?;
            fs::write(&stamp_path, serde_json::to_string_pretty(current)?)?;
        }

        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY).unwrap());
        Ok(Self {
            dir: dir.to_path_buf(),
            memory: Mutex::new(LruCache::new(capacity)),
        })
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<serde_json::Value>> {
        let key_string = key.as_string();
        {
            let mut memory = self.memory.lock().unwrap();
            if let Some(value) = memory.get(&key_string) {
                return Some(Arc::clone(value));
            }
        }

        let path = self.entry_path(key);
        let raw = fs::read_to_string(path).ok()?;
        let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
        let value = Arc::new(value);
        self.memory
            .lock()
            .unwrap()
            .put(key_string, Arc::clone(&value));
        Some(value)
    }

    pub fn put(&self, key: &CacheKey, value: serde_json::Value) -> Result<()> {
        let path = self.entry_path(key);
        fs::write(&path, serde_json::to_string(&value)?)
            .with_context(|| format!("cannot write cache entry {:?}", path))?;
        self.memory
            .lock()
            .unwrap()
            .put(key.as_string(), Arc::new(value));
        Ok(())
    }

    /// Wholesale eviction, also used by the startup check.
    pub fn clear(&self) -> Result<()> {
        self.memory.lock().unwrap().clear();
        fs::remove_dir_all(self.dir.join(ENTRIES_DIR)).ok();
        fs::create_dir_all(self.dir.join(ENTRIES_DIR))?;
        Ok(())
    }

    /// (entries on disk, in-memory capacity)
    pub fn stats(&self) -> (usize, usize) {
        let on_disk = fs::read_dir(self.dir.join(ENTRIES_DIR))
            .map(|entries| entries.count())
            .unwrap_or(0);
        let capacity = self.memory.lock().unwrap().cap().get();
        (on_disk, capacity)
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(ENTRIES_DIR).join(key.file_name())
    }
}

// ── Tests ──
