//! Throttled reading-position store.
//!
//! Readers emit a position update on every scroll tick; writing each one
//! through would hammer the disk. Updates to the same key are coalesced into
//! one write after a quiescence window, and `flush` writes everything pending
//! synchronously for shutdown/backgrounding so no update is silently dropped.
//!
//! The store is an owned value constructed by the caller and passed down, so
//! concurrent test runs and multiple corpora never share hidden state. There
//! is no background thread: callers drive the clock with `tick`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPosition {
    pub book_id: String,
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
}

pub struct PositionStore {
    path: PathBuf,
    quiescence: Duration,
    persisted: HashMap<String, ReadingPosition>,
    pending: HashMap<String, (ReadingPosition, Instant)>,
}

impl PositionStore {
    /// Open (or create) a store file. Missing file means an empty store.
    pub fn open(path: &Path, quiescence: Duration) -> Result<Self> {
        let persisted = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("position store {:?} is corrupt", path))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e).with_context(|| format!("cannot read {:?}", path)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            quiescence,
            persisted,
            pending: HashMap::new(),
        })
    }

    /// Record an update. Later saves to the same key replace the pending one
    /// and restart its quiescence window; nothing is written yet.
    pub fn save(&mut self, key: &str, position: ReadingPosition) {
        self.pending
            .insert(key.to_string(), (position, Instant::now()));
    }

    /// Reads see the newest value, pending or persisted.
    pub fn get(&self, key: &str) -> Option<&ReadingPosition> {
        self.pending
            .get(key)
            .map(|(p, _)| p)
            .or_else(|| self.persisted.get(key))
    }

    /// Write out every pending update whose quiescence window has elapsed.
    /// Returns how many keys were flushed.
    pub fn tick(&mut self) -> Result<usize> {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, (_, at))| at.elapsed() >= self.quiescence)
            .map(|(k, _)| k.clone())
            .collect();

        if due.is_empty() {
            return Ok(0);
        }
        for key in &due {
            if let Some((position, _)) = self.pending.remove(key) {
                self.persisted.insert(key.clone(), position);
            }
        }
        self.write()?;
        debug!("flushed {} quiescent position(s)", due.len());
        Ok(due.len())
    }

    /// Synchronous full flush for shutdown/backgrounding: every pending
    /// update is written regardless of its window.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        for (key, (position, _)) in std::mem::take(&mut self.pending) {
            self.persisted.insert(key, position);
        }
        self.write()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn write(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.persisted)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("cannot write position store {:?}", self.path))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn position(page: &str) -> ReadingPosition {
        ReadingPosition {
            book_id: "sozler".into(),
            page_id: page.into(),
            block_id: None,
        }
    }

    #[test]
    fn coalesces_rapid_saves_into_one_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");
        let mut store = PositionStore::open(&path, Duration::ZERO).unwrap();

        store.save("device-1", position("0001"));
        store.save("device-1", position("0002"));
        store.save("device-1", position("0003"));
        assert_eq!(store.pending_count(), 1);

        let flushed = store.tick().unwrap();
        assert_eq!(flushed, 1);
        assert_eq!(store.get("device-1").unwrap().page_id, "0003");
    }

    #[test]
    fn tick_respects_quiescence_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");
        let mut store = PositionStore::open(&path, Duration::from_secs(60)).unwrap();

        store.save("device-1", position("0001"));
        assert_eq!(store.tick().unwrap(), 0);
        assert_eq!(store.pending_count(), 1);
        // reads still see the pending value
        assert_eq!(store.get("device-1").unwrap().page_id, "0001");
    }

    #[test]
    fn flush_writes_everything_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");
        {
            let mut store = PositionStore::open(&path, Duration::from_secs(60)).unwrap();
            store.save("device-1", position("0004"));
            store.save("device-2", position("0009"));
            store.flush().unwrap();
            assert_eq!(store.pending_count(), 0);
        }
        let store = PositionStore::open(&path, Duration::from_secs(60)).unwrap();
        assert_eq!(store.get("device-1").unwrap().page_id, "0004");
        assert_eq!(store.get("device-2").unwrap().page_id, "0009");
    }

    #[test]
    fn stores_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = PositionStore::open(&dir.path().join("a.json"), Duration::ZERO).unwrap();
        let mut b = PositionStore::open(&dir.path().join("b.json"), Duration::ZERO).unwrap();
        a.save("device-1", position("0001"));
        a.flush().unwrap();
        b.tick().unwrap();
        assert!(b.get("device-1").is_none());
    }
}
