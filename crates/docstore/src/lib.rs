//! Versioned JSON documents.
//!
//! A [`DocumentStore`] reads and writes whole JSON documents by path on top of
//! a [`Backend`] that keeps every revision: a local git repository
//! ([`GitBackend`]) or a repository behind the GitHub contents API
//! ([`GitHubBackend`]). Every write carries the version token of the revision
//! it replaces, so a concurrent writer shows up as [`StoreError::Conflict`]
//! instead of being silently overwritten. The token is the one seen when the
//! document was last read or written through the same store.

mod error;
mod git;
mod github;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use error::StoreError;
pub use git::GitBackend;
pub use github::{DEFAULT_API_URL as DEFAULT_GITHUB_API_URL, GitHubBackend};

pub type Result<T> = std::result::Result<T, StoreError>;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Raw document content plus the token identifying its revision.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub content: String,
    pub version: String,
}

pub trait Backend {
    /// Identifies the repository, used to key cached reads.
    fn location(&self) -> &str;

    /// `Ok(None)` when nothing exists at `path`.
    fn fetch(&self, path: &str) -> Result<Option<Blob>>;

    /// Returns the version token of the new revision.
    fn create(&self, path: &str, content: &str, message: &str) -> Result<String>;

    /// Replaces the revision identified by `version`.
    fn update(&self, path: &str, content: &str, message: &str, version: &str) -> Result<String>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn location(&self) -> &str {
        (**self).location()
    }

    fn fetch(&self, path: &str) -> Result<Option<Blob>> {
        (**self).fetch(path)
    }

    fn create(&self, path: &str, content: &str, message: &str) -> Result<String> {
        (**self).create(path, content, message)
    }

    fn update(&self, path: &str, content: &str, message: &str, version: &str) -> Result<String> {
        (**self).update(path, content, message, version)
    }
}

type CacheKey = (String, String);

/// What the store last saw at a path.
#[derive(Debug, Clone, PartialEq)]
enum Revision {
    Absent,
    At(String),
    /// The fetch failed, so nothing is known about the current content.
    Unreadable,
}

pub struct DocumentStore<B: Backend> {
    backend: B,
    ttl: Duration,
    cache: HashMap<CacheKey, (Instant, serde_json::Value)>,
    revisions: HashMap<CacheKey, Revision>,
}

impl<B: Backend> DocumentStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            ttl: DEFAULT_CACHE_TTL,
            cache: HashMap::new(),
            revisions: HashMap::new(),
        }
    }

    /// A zero TTL disables caching.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn key(&self, path: &str) -> CacheKey {
        (self.backend.location().to_string(), path.to_string())
    }

    pub fn invalidate(&mut self, path: &str) {
        let key = self.key(path);
        self.cache.remove(&key);
    }

    /// Reads and decodes the document at `path`.
    ///
    /// Returns `None` when the document does not exist, and also (with a
    /// warning) when it cannot be fetched or decoded. Callers supply their own
    /// default.
    pub fn read<T: DeserializeOwned>(&mut self, path: &str) -> Option<T> {
        let key = self.key(path);
        let value = match self.cache.get(&key) {
            Some((at, value)) if at.elapsed() < self.ttl => {
                debug!(path, "document served from cache");
                value.clone()
            }
            _ => {
                let value = self.fetch_value(key.clone(), path)?;
                if !self.ttl.is_zero() {
                    self.cache.insert(key, (Instant::now(), value.clone()));
                }
                value
            }
        };

        match serde_json::from_value(value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(path, error = %e, "document does not have the expected shape");
                None
            }
        }
    }

    fn fetch_value(&mut self, key: CacheKey, path: &str) -> Option<serde_json::Value> {
        let blob = match self.backend.fetch(path) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!(path, "document does not exist");
                self.revisions.insert(key, Revision::Absent);
                return None;
            }
            Err(e) => {
                self.revisions.insert(key, Revision::Unreadable);
                warn!(
                    location = self.backend.location(),
                    path,
                    error = %e,
                    "failed to read document"
                );
                return None;
            }
        };
        self.revisions.insert(key, Revision::At(blob.version));
        match serde_json::from_str(&blob.content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path, error = %e, "document is not valid JSON");
                None
            }
        }
    }

    /// Serializes `doc` and commits it at `path` with `message`.
    ///
    /// Replaces the revision this store last read or wrote, or creates the
    /// document when it was seen absent. A path never read is looked up
    /// first. A document that could not be read is never overwritten.
    /// Nothing is retried: a rate limit, a permission problem or a concurrent
    /// writer comes back as an error.
    pub fn write<T: Serialize + ?Sized>(&mut self, path: &str, doc: &T, message: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)?;
        let key = self.key(path);

        let known = match self.revisions.get(&key) {
            Some(Revision::At(version)) => Some(version.clone()),
            Some(Revision::Absent) => None,
            Some(Revision::Unreadable) => return Err(StoreError::Conflict(path.to_string())),
            None => self.backend.fetch(path)?.map(|current| current.version),
        };
        let version = match known {
            Some(known) => self.backend.update(path, &content, message, &known)?,
            None => self.backend.create(path, &content, message)?,
        };
        debug!(path, version, "document written");

        self.cache.remove(&key);
        self.revisions.insert(key, Revision::At(version));
        Ok(())
    }
}
