//! A content-addressed, directory-backed cache with mtime-ordered LRU
//! eviction (spec.md §5, "Parquet-style cache" -- generalized here to an
//! arbitrary JSON blob per entry, since the engine has no dependency on a
//! columnar format).

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use resolve_core::cache::{CacheKey, CachePolicy};
use resolve_core::resolver::ResolverOutput;

use crate::error::CacheResult;

/// A cache whose entries are individual files under `root`, named by a
/// hash of their [`CacheKey`]. [`Self::enforce_limit`] lists files sorted by
/// mtime ascending and evicts the oldest ones, one at a time, until the
/// total size on disk is at most a byte budget (spec.md §4.5: "Parquet-style
/// cache"); nothing else in this cache touches mtimes, so "oldest" here
/// means "least recently written or read", refreshed on every [`Self::get`]
/// hit by re-touching the file.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Creates `root` if it doesn't exist.
    pub fn open(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        key.0.hash(&mut hasher);
        self.root.join(format!("{:016x}.json", hasher.finish()))
    }

    fn entries(&self) -> CacheResult<Vec<(PathBuf, std::time::SystemTime, u64)>> {
        let entries = fs::read_dir(&self.root)?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                let mtime = meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                Some((entry.path(), mtime, meta.len()))
            })
            .collect();
        Ok(entries)
    }

    /// Evicts the oldest-mtime files, one at a time, until the total size of
    /// remaining entries is at most `max_total_bytes`. A file that has
    /// already vanished by the time its turn to be evicted comes up is
    /// treated as a no-op rather than an error (spec.md §4.5: "missing
    /// files are tolerated").
    pub fn enforce_limit(&self, max_total_bytes: u64) -> CacheResult<()> {
        let mut entries = self.entries()?;
        entries.sort_by_key(|(_, mtime, _)| *mtime);

        let mut total: u64 = entries.iter().map(|(_, _, size)| size).sum();
        for (path, _, size) in entries {
            if total <= max_total_bytes {
                break;
            }
            tracing::debug!(path = %path.display(), "evicting cache entry");
            match fs::remove_file(&path) {
                Ok(()) => total = total.saturating_sub(size),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    total = total.saturating_sub(size);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        fs::read_dir(&self.root)
            .map(|dir| dir.filter_map(Result::ok).count())
            .unwrap_or(0)
    }

    /// Total size, in bytes, of every entry currently on disk.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries()
            .map(|entries| entries.iter().map(|(_, _, size)| size).sum())
            .unwrap_or(0)
    }

    fn try_get(&self, key: &CacheKey) -> CacheResult<Option<Vec<ResolverOutput>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        touch(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn try_put(&self, key: &CacheKey, outputs: &[ResolverOutput]) -> CacheResult<()> {
        let path = self.path_for(key);
        let contents = serde_json::to_string(outputs)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// Bumps `path`'s mtime forward so it sorts as most-recently-used on the
/// next [`FileCache::enforce_limit`] pass. Reopening the file for append and
/// writing zero bytes is a modification on every common filesystem, which
/// avoids pulling in a dedicated crate just to set a timestamp.
fn touch(path: &Path) -> CacheResult<()> {
    use std::fs::OpenOptions;
    use std::io::Write;

    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(b"")?;
    file.sync_all()?;
    Ok(())
}

impl CachePolicy for FileCache {
    fn get(&self, key: &CacheKey) -> Option<Vec<ResolverOutput>> {
        match self.try_get(key) {
            Ok(outputs) => outputs,
            Err(e) => {
                tracing::warn!(error = %e, %key, "file cache read failed, treating as a miss");
                None
            }
        }
    }

    fn put(&self, key: &CacheKey, outputs: &[ResolverOutput]) {
        if let Err(e) = self.try_put(key, outputs) {
            tracing::warn!(error = %e, %key, "file cache write failed, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolve_core::types::{FactId, FactValueData};

    fn sample_outputs(tag: &str) -> Vec<ResolverOutput> {
        vec![ResolverOutput::new(FactId::from("f"), FactValueData::from(tag))]
    }

    #[test]
    fn miss_then_hit_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        let key = CacheKey("r|a=1".to_owned());

        assert!(cache.get(&key).is_none());
        cache.put(&key, &sample_outputs("v"));
        assert_eq!(cache.get(&key), Some(sample_outputs("v")));
    }

    #[test]
    fn enforce_limit_evicts_oldest_mtime_first_until_under_budget() {
        // spec.md §8 scenario 6: three 800-byte files, max_total_bytes=1500.
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();

        let mut paths = Vec::new();
        for i in 0..3 {
            let path = dir.path().join(format!("entry_{i}.bin"));
            fs::write(&path, vec![b'x'; 800]).unwrap();
            paths.push(path);
            // Distinct mtimes so eviction order is well-defined.
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(cache.total_size(), 2400);

        cache.enforce_limit(1500).unwrap();

        assert!(cache.total_size() <= 1500);
        assert!(!paths[0].exists(), "the oldest-mtime file should be evicted first");
        assert!(paths[2].exists(), "the newest file should survive");
    }

    #[test]
    fn enforce_limit_on_an_empty_cache_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        cache.enforce_limit(0).unwrap();
        assert_eq!(cache.total_size(), 0);
    }
}
