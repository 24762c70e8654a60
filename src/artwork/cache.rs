use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use sha2::{Digest, Sha256};

use crate::foundation::error::{FmiError, FmiResult};

/// The two independent stores kept by [`ArtworkCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheNamespace {
    /// Resolved artwork bytes, keyed by [`CacheKey::album`].
    Art,
    /// Catalog release identifiers, keyed by [`CacheKey::identifier`].
    Identifier,
}

impl CacheNamespace {
    pub const ALL: [Self; 2] = [Self::Art, Self::Identifier];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Art => "art",
            Self::Identifier => "identifier",
        }
    }
}

impl std::fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.dir_name())
    }
}

/// Lowercase hex SHA-256 digest identifying one cache entry.
///
/// Inputs are hashed exactly as given; callers that want case-insensitive hits must normalize first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl CacheKey {
    /// Key for artwork bytes of an `(artist, album)` pair.
    pub fn album(artist: &str, album: &str) -> Self {
        // NUL separator keeps ("ab", "c") and ("a", "bc") apart.
        Self(sha256_hex(&[artist.as_bytes(), b"\0", album.as_bytes()]))
    }

    /// Key for the catalog identifier of `artist:album`.
    pub fn identifier(artist: &str, album: &str) -> Self {
        Self(sha256_hex(&[format!("{artist}:{album}").as_bytes()]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_file_name(name: &str) -> Option<Self> {
        (name.len() == 64 && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')))
            .then(|| Self(name.to_string()))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Byte budgets per namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CacheBudgets {
    pub art_bytes: u64,
    pub identifier_bytes: u64,
}

impl Default for CacheBudgets {
    fn default() -> Self {
        Self {
            art_bytes: 2 * 1024 * 1024 * 1024,
            identifier_bytes: 1024 * 1024 * 1024,
        }
    }
}

impl CacheBudgets {
    pub fn for_namespace(&self, ns: CacheNamespace) -> u64 {
        match ns {
            CacheNamespace::Art => self.art_bytes,
            CacheNamespace::Identifier => self.identifier_bytes,
        }
    }
}

/// Snapshot of one namespace's occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: u64,
    pub budget_bytes: u64,
}

struct Entry {
    size: u64,
    tick: u64,
    /// Held in memory for the in-memory variant; read from disk otherwise.
    value: Option<Vec<u8>>,
}

struct Store {
    dir: Option<PathBuf>,
    budget: u64,
    total: u64,
    next_tick: u64,
    entries: HashMap<CacheKey, Entry>,
    recency: BTreeMap<u64, CacheKey>,
}

impl Store {
    fn new(dir: Option<PathBuf>, budget: u64) -> Self {
        Self {
            dir,
            budget,
            total: 0,
            next_tick: 0,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
        }
    }

    fn bump(&mut self) -> u64 {
        let t = self.next_tick;
        self.next_tick += 1;
        t
    }

    fn path_for(&self, key: &CacheKey) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(key.as_str()))
    }

    fn touch(&mut self, key: &CacheKey) {
        let tick = self.bump();
        if let Some(entry) = self.entries.get_mut(key) {
            self.recency.remove(&entry.tick);
            entry.tick = tick;
            self.recency.insert(tick, key.clone());
        }
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        self.total = self.total.saturating_sub(entry.size);
        Some(entry)
    }

    fn get(&mut self, key: &CacheKey) -> Option<Vec<u8>> {
        let in_memory = self.entries.get(key)?.value.clone();
        let value = match in_memory {
            Some(v) => v,
            None => {
                let path = self.path_for(key)?;
                match fs::read(&path) {
                    Ok(bytes) => {
                        touch_mtime(&path);
                        bytes
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "cache entry vanished");
                        self.remove(key);
                        return None;
                    }
                }
            }
        };
        self.touch(key);
        Some(value)
    }

    fn set(&mut self, key: CacheKey, value: Vec<u8>) -> FmiResult<bool> {
        let size = value.len() as u64;
        if size > self.budget {
            return Ok(false);
        }

        // Index changes only after the new bytes are durable; a failed write keeps the old entry.
        let stored = match self.path_for(&key) {
            Some(path) => {
                write_atomic(&path, &value)?;
                None
            }
            None => Some(value),
        };
        self.remove(&key);

        let tick = self.bump();
        self.recency.insert(tick, key.clone());
        self.entries.insert(
            key,
            Entry {
                size,
                tick,
                value: stored,
            },
        );
        self.total += size;
        self.evict_to_budget();
        Ok(true)
    }

    fn evict_to_budget(&mut self) -> usize {
        let mut evicted = 0;
        while self.total > self.budget {
            let Some((_, key)) = self.recency.pop_first() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&key) {
                self.total = self.total.saturating_sub(entry.size);
                if let Some(path) = self.path_for(&key) {
                    let _ = fs::remove_file(path);
                }
                evicted += 1;
            }
        }
        evicted
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            bytes: self.total,
            budget_bytes: self.budget,
        }
    }
}

fn touch_mtime(path: &Path) {
    if let Ok(f) = fs::File::options().write(true).open(path) {
        let _ = f.set_modified(SystemTime::now());
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> FmiResult<()> {
    let temp_path = path.with_extension("tmp");
    if temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    fs::write(&temp_path, bytes)
        .with_context(|| format!("write cache temp file {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("move cache file into place {}", path.display()))?;
    Ok(())
}

/// Files directly inside `dir` as `(path, size, mtime millis)`.
fn list_files(dir: &Path) -> Vec<(PathBuf, u64, u128)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .ok()
            .and_then(|value| value.duration_since(UNIX_EPOCH).ok())
            .map(|duration| duration.as_millis())
            .unwrap_or(0);
        files.push((entry.path(), metadata.len(), modified));
    }
    files
}

fn open_store(dir: PathBuf, budget: u64) -> FmiResult<Store> {
    fs::create_dir_all(&dir).with_context(|| format!("create cache dir {}", dir.display()))?;

    let mut files = list_files(&dir);
    files.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.cmp(&b.0)));

    let mut store = Store::new(Some(dir), budget);
    for (path, size, _) in files {
        let key = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(CacheKey::from_file_name);
        let Some(key) = key else {
            // Leftover temp files from interrupted writes, or foreign files.
            if path.extension().is_some_and(|e| e == "tmp") {
                let _ = fs::remove_file(&path);
            }
            continue;
        };
        let tick = store.bump();
        store.recency.insert(tick, key.clone());
        store.entries.insert(
            key,
            Entry {
                size,
                tick,
                value: None,
            },
        );
        store.total += size;
    }
    Ok(store)
}

/// Size-bounded key to bytes store with independent `art` and `identifier` namespaces.
///
/// Safe to share across tasks; each namespace has its own lock and last writer wins.
pub struct ArtworkCache {
    root: Option<PathBuf>,
    art: Mutex<Store>,
    identifier: Mutex<Store>,
}

impl std::fmt::Debug for ArtworkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtworkCache")
            .field("root", &self.root)
            .field("art", &self.stats(CacheNamespace::Art))
            .field("identifier", &self.stats(CacheNamespace::Identifier))
            .finish()
    }
}

impl ArtworkCache {
    /// Process-local cache that forgets everything on drop.
    pub fn in_memory(budgets: CacheBudgets) -> Self {
        Self {
            root: None,
            art: Mutex::new(Store::new(None, budgets.art_bytes)),
            identifier: Mutex::new(Store::new(None, budgets.identifier_bytes)),
        }
    }

    /// Open (or create) the on-disk cache under `root`, rebuilding the index from the files
    /// present and pruning each namespace down to its budget.
    #[tracing::instrument(level = "debug", skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>, budgets: CacheBudgets) -> FmiResult<Self> {
        let root = root.as_ref().to_path_buf();
        let mut art = open_store(root.join(CacheNamespace::Art.dir_name()), budgets.art_bytes)?;
        let mut identifier = open_store(
            root.join(CacheNamespace::Identifier.dir_name()),
            budgets.identifier_bytes,
        )?;

        for (ns, store) in [
            (CacheNamespace::Art, &mut art),
            (CacheNamespace::Identifier, &mut identifier),
        ] {
            let pruned = store.evict_to_budget();
            tracing::info!(
                namespace = %ns,
                entries = store.entries.len(),
                bytes = store.total,
                pruned,
                "cache namespace opened"
            );
        }

        Ok(Self {
            root: Some(root),
            art: Mutex::new(art),
            identifier: Mutex::new(identifier),
        })
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn store(&self, ns: CacheNamespace) -> MutexGuard<'_, Store> {
        let m = match ns {
            CacheNamespace::Art => &self.art,
            CacheNamespace::Identifier => &self.identifier,
        };
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, ns: CacheNamespace, key: &CacheKey) -> Option<Vec<u8>> {
        let hit = self.store(ns).get(key);
        tracing::debug!(namespace = %ns, %key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Store `value` under `key`, evicting least-recently-used entries to stay within budget.
    ///
    /// A value larger than the whole namespace budget is silently not stored.
    pub fn set(&self, ns: CacheNamespace, key: CacheKey, value: Vec<u8>) -> FmiResult<()> {
        let size = value.len();
        let stored = self.store(ns).set(key, value)?;
        if !stored {
            tracing::debug!(namespace = %ns, size, "value exceeds cache budget; not stored");
        }
        Ok(())
    }

    pub fn stats(&self, ns: CacheNamespace) -> CacheStats {
        self.store(ns).stats()
    }

    /// Identifier string cached for `artist:album`, if any.
    pub fn get_identifier(&self, artist: &str, album: &str) -> Option<String> {
        let bytes = self.get(CacheNamespace::Identifier, &CacheKey::identifier(artist, album))?;
        match String::from_utf8(bytes) {
            Ok(s) => Some(s),
            Err(_) => {
                tracing::warn!(artist, album, "cached identifier is not utf-8; ignoring");
                None
            }
        }
    }

    pub fn set_identifier(&self, artist: &str, album: &str, id: &str) -> FmiResult<()> {
        if id.is_empty() {
            return Err(FmiError::validation("catalog identifier must be non-empty"));
        }
        self.set(
            CacheNamespace::Identifier,
            CacheKey::identifier(artist, album),
            id.as_bytes().to_vec(),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/artwork/cache.rs"]
mod tests;
