//! Pluggable result caches.
//!
//! Analyses never cache on their own; hosts inject a [`ResultCache`] and key
//! entries with [`cache_key`], which folds the whole file batch into the key
//! so stale sources can never hit.

use crate::call_graph::{CallGraph, GraphSnapshot};
use crate::error::{CausalError, CausalResult};
use crate::models::SourceFile;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Byte-level key/value store for serialized analysis results
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &str) -> CausalResult<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: Vec<u8>) -> CausalResult<()>;
}

/// `"{kind}:{repo}:{branch}:{target}:{digest}"`, digest = blake3 over every path and content
pub fn cache_key(kind: &str, repo: &str, branch: &str, target: &str, files: &[SourceFile]) -> String {
    format!("{}:{}:{}:{}:{}", kind, repo, branch, target, batch_digest(files))
}

/// Hex digest of a file batch; order-sensitive
pub fn batch_digest(files: &[SourceFile]) -> String {
    let mut hasher = blake3::Hasher::new();
    for file in files {
        hasher.update(file.path.as_bytes());
        hasher.update(&[0]);
        hasher.update(file.content.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}

/// In-process cache with optional TTL and an entry bound (oldest evicted first)
pub struct MemoryCache {
    entries: Mutex<IndexMap<String, (Instant, Vec<u8>)>>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> CausalResult<std::sync::MutexGuard<'_, IndexMap<String, (Instant, Vec<u8>)>>> {
        self.entries
            .lock()
            .map_err(|_| CausalError::Cache("memory cache lock poisoned".to_string()))
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &str) -> CausalResult<Option<Vec<u8>>> {
        let mut entries = self.lock()?;
        let expired = match (entries.get(key), self.ttl) {
            (None, _) => return Ok(None),
            (Some((stored_at, _)), Some(ttl)) => stored_at.elapsed() > ttl,
            (Some(_), None) => false,
        };
        if expired {
            entries.shift_remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(_, value)| value.clone()))
    }

    fn put(&self, key: &str, value: Vec<u8>) -> CausalResult<()> {
        let mut entries = self.lock()?;
        entries.shift_remove(key);
        while entries.len() >= self.max_entries {
            entries.shift_remove_index(0);
        }
        entries.insert(key.to_string(), (Instant::now(), value));
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    created_at: u64,
    payload: Vec<u8>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// On-disk cache backed by sled
pub struct SledCache {
    db: Db,
    ttl: Option<Duration>,
}

impl SledCache {
    /// Opens (or creates) the database at `path`
    pub fn open(path: impl AsRef<Path>, ttl: Option<Duration>) -> CausalResult<Self> {
        let db = sled::open(path.as_ref())?;
        Ok(Self { db, ttl })
    }

    fn is_expired(&self, created_at: u64) -> bool {
        match self.ttl {
            Some(ttl) => unix_now().saturating_sub(created_at) > ttl.as_secs(),
            None => false,
        }
    }

    /// Persists a graph snapshot under `graph:{graph_id}`
    pub fn save_graph(&self, graph_id: &str, graph: &CallGraph) -> CausalResult<()> {
        let serialized = bincode::serialize(&graph.to_snapshot())?;
        self.put(&format!("graph:{}", graph_id), serialized)
    }

    /// Restores a graph snapshot; a snapshot whose edges reference missing nodes is an error
    pub fn load_graph(&self, graph_id: &str) -> CausalResult<Option<CallGraph>> {
        let Some(data) = self.get(&format!("graph:{}", graph_id))? else {
            return Ok(None);
        };
        let snapshot: GraphSnapshot = bincode::deserialize(&data)?;
        CallGraph::from_snapshot(snapshot).map(Some)
    }

    pub fn flush(&self) -> CausalResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl ResultCache for SledCache {
    fn get(&self, key: &str) -> CausalResult<Option<Vec<u8>>> {
        let Some(raw) = self.db.get(key)? else {
            return Ok(None);
        };
        let envelope: Envelope = bincode::deserialize(raw.as_ref())?;
        if self.is_expired(envelope.created_at) {
            debug!(key = %key, "Cache entry expired");
            self.db.remove(key)?;
            return Ok(None);
        }
        Ok(Some(envelope.payload))
    }

    fn put(&self, key: &str, value: Vec<u8>) -> CausalResult<()> {
        let envelope = Envelope {
            created_at: unix_now(),
            payload: value,
        };
        self.db.insert(key, bincode::serialize(&envelope)?)?;
        Ok(())
    }
}
