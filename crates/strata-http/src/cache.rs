//! Local disk cache for downloaded pages and service invocations.
//!
//! Entries are JSON files named by a prefix (the resource they belong to)
//! plus the first 12 hex characters of a SHA-256 over the request
//! descriptor, so any parameter that changes the response changes the file
//! name. Corrupt entries are treated as misses.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use strata_types::{Result, StrataError};

/// Length of the hex digest kept in cache file names.
const DIGEST_LEN: usize = 12;

/// A directory holding cache entries.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Creates (if needed) and opens a cache directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StrataError::Cache(format!("cannot create {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    /// Returns the default cache location.
    ///
    /// Uses the platform cache directory (`~/.cache/strata/` on Linux),
    /// falling back to the system temp directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "strata").map_or_else(
            || std::env::temp_dir().join("strata"),
            |dirs| dirs.cache_dir().to_path_buf(),
        )
    }

    /// Opens the cache at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_default_path() -> Result<Self> {
        Self::new(Self::default_path())
    }

    /// Returns the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hashes a request descriptor into the short digest used in file names.
    #[must_use]
    pub fn digest(descriptor: &str) -> String {
        let hash = format!("{:x}", Sha256::digest(descriptor.as_bytes()));
        hash[..DIGEST_LEN].to_string()
    }

    /// Path of the entry for `descriptor` under the given prefix.
    #[must_use]
    pub fn entry_path(&self, prefix: &str, descriptor: &str) -> PathBuf {
        self.root
            .join(format!("{prefix}{}.json", Self::digest(descriptor)))
    }

    /// Reads a JSON entry. Missing or corrupt files are misses.
    #[must_use]
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let body = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&body) {
            Ok(value) => {
                debug!(path = %path.display(), "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt cache entry");
                None
            }
        }
    }

    /// Writes a JSON entry.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let body = serde_json::to_string(value)?;
        self.write_text(path, &body)
    }

    /// Reads a raw entry body, if present.
    #[must_use]
    pub fn read_text(&self, path: &Path) -> Option<String> {
        fs::read_to_string(path).ok()
    }

    /// Writes a raw entry body.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_text(&self, path: &Path, body: &str) -> Result<()> {
        fs::write(path, body)
            .map_err(|e| StrataError::Cache(format!("cannot write {}: {e}", path.display())))
    }

    /// Reads a TTL entry; entries older than `ttl_minutes` are misses.
    #[must_use]
    pub fn read_ttl<T: DeserializeOwned>(
        &self,
        prefix: &str,
        descriptor: &str,
        ttl_minutes: u64,
    ) -> Option<T> {
        if ttl_minutes == 0 {
            return None;
        }
        let path = self.entry_path(prefix, descriptor);
        let entry: TtlEntry<T> = self.read_json(&path)?;
        let age = Utc::now() - entry.cached_at;
        if age.num_minutes() >= 0 && (age.num_minutes() as u64) < ttl_minutes {
            Some(entry.value)
        } else {
            debug!(path = %path.display(), "cache entry expired");
            None
        }
    }

    /// Writes a TTL entry stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_ttl<T: Serialize>(&self, prefix: &str, descriptor: &str, value: &T) -> Result<()> {
        let path = self.entry_path(prefix, descriptor);
        self.write_json(
            &path,
            &TtlEntry {
                cached_at: Utc::now(),
                value,
            },
        )
    }

    /// Removes all entries whose file name starts with `prefix`.
    ///
    /// Returns the number of removed entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or a file cannot be
    /// removed.
    pub fn clear_prefix(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(prefix) {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// A cached value with the time it was stored.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TtlEntry<T> {
    /// When the value was cached.
    pub cached_at: DateTime<Utc>,
    /// The cached value.
    pub value: T,
}
