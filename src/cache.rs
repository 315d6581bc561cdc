use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::fetch::PageFetcher;

/// Raw page markup on disk, one `.html` file per key.
pub struct CacheStore {
    root: PathBuf,
}

pub struct CacheStats {
    pub entries: usize,
    pub bytes: u64,
}

impl CacheStore {
    /// Open the store, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create cache dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.html", encode_key(key)))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }
        let html = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cached page {}", path.display()))?;
        Ok(Some(html))
    }

    pub fn put(&self, key: &str, html: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, html)
            .with_context(|| format!("Failed to write cached page {}", path.display()))
    }
}

/// Count cached pages under `root` without creating it; a missing
/// directory is an empty cache.
pub fn stats_at(root: &Path) -> Result<CacheStats> {
    let mut stats = CacheStats { entries: 0, bytes: 0 };
    if !root.is_dir() {
        return Ok(stats);
    }
    for entry in fs::read_dir(root)
        .with_context(|| format!("Failed to read cache dir {}", root.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "html") {
            stats.entries += 1;
            stats.bytes += entry.metadata()?.len();
        }
    }
    Ok(stats)
}

/// Filesystem-safe, injective file stem for a cache key.
///
/// ASCII alphanumerics, `.`, `_` and `-` pass through; every other byte is
/// written as `%XX`.
pub fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Cache-first page loading: the fetcher is only consulted on a miss.
pub struct CachedFetcher<F> {
    store: CacheStore,
    fetcher: F,
    host: String,
    pub hits: usize,
    pub misses: usize,
}

impl<F: PageFetcher> CachedFetcher<F> {
    pub fn new(store: CacheStore, fetcher: F, host: impl Into<String>) -> Self {
        Self {
            store,
            fetcher,
            host: host.into(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn url_for(&self, link: &str) -> String {
        format!("{}{}", self.host, link)
    }

    /// Return the markup for `key`, fetching `link` on a miss and storing it.
    pub async fn load(&mut self, key: &str, link: &str, ready_selector: &str) -> Result<String> {
        if let Some(html) = self.store.get(key)? {
            debug!(key, "cache hit");
            self.hits += 1;
            return Ok(html);
        }

        self.misses += 1;
        let url = self.url_for(link);
        let html = self
            .fetcher
            .fetch(&url, ready_selector)
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        self.store.put(key, &html)?;
        Ok(html)
    }
}
