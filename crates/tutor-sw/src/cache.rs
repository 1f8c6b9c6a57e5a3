//! Versioned cache buckets (`caches` / `Cache`).
//!
//! A bucket maps a request identity (method + URL without fragment) to a
//! whole stored response. Entries are always replaced as a unit, so a
//! concurrent writer can only ever observe an old or a new entry.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use hashbrown::HashMap;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use tutor_net::{Request, Response};
use url::Url;

use crate::SwError;

/// Storage key for a request.
pub fn cache_key(method: &Method, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    format!("{method} {url}")
}

// ==================== Entry ====================

/// One header line. Values are raw bytes; they need not be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHeader {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub value: Bytes,
}

/// A cached response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request URL the entry answers (fragment stripped).
    pub url: String,

    /// Request method.
    pub method: String,

    /// Response status.
    pub status: u16,

    /// Response headers in arrival order, repeated names kept.
    pub headers: Vec<StoredHeader>,

    /// Response body.
    #[serde(with = "base64_bytes")]
    pub body: Bytes,

    /// Cached at timestamp (ms since epoch).
    pub cached_at: u64,
}

impl CacheEntry {
    /// Build an entry, applying the same admission rules as `Cache.put()`.
    pub fn for_storage(request: &Request, response: &Response) -> Result<Self, SwError> {
        if request.method != Method::GET {
            return Err(SwError::CacheError(format!(
                "cannot store {} request for {}",
                request.method, request.url
            )));
        }
        if response.status == StatusCode::PARTIAL_CONTENT {
            return Err(SwError::CacheError(format!(
                "cannot store partial response for {}",
                request.url
            )));
        }

        let headers = response
            .headers
            .iter()
            .map(|(name, value)| StoredHeader {
                name: name.as_str().to_string(),
                value: Bytes::copy_from_slice(value.as_bytes()),
            })
            .collect();

        let mut url = request.url.clone();
        url.set_fragment(None);

        Ok(Self {
            url: url.to_string(),
            method: request.method.to_string(),
            status: response.status.as_u16(),
            headers,
            body: response.body().clone(),
            cached_at: now_millis(),
        })
    }

    /// Storage key of this entry.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// Rebuild a response from the stored entry.
    pub fn to_response(&self) -> Result<Response, SwError> {
        let url = Url::parse(&self.url)
            .map_err(|e| SwError::Storage(format!("corrupt entry url {}: {e}", self.url)))?;
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| SwError::Storage(format!("corrupt entry status {}: {e}", self.status)))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for header in &self.headers {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|e| SwError::Storage(format!("corrupt header name {}: {e}", header.name)))?;
            let value = HeaderValue::from_bytes(&header.value)
                .map_err(|e| SwError::Storage(format!("corrupt value for {}: {e}", header.name)))?;
            headers.append(name, value);
        }

        let mut response = Response::new(url, status).with_body(self.body.clone());
        response.headers = headers;
        Ok(response)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

// ==================== Cache ====================

/// A single named bucket.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Cache {
    /// Cache name (the version string).
    pub name: String,

    entries: HashMap<String, CacheEntry>,
}

impl Cache {
    /// Create an empty cache.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Match a request. Only GET requests ever match.
    pub fn match_request(&self, request: &Request) -> Option<&CacheEntry> {
        if request.method != Method::GET {
            return None;
        }
        self.entries.get(&cache_key(&request.method, &request.url))
    }

    /// Store a response for a request, replacing any previous entry.
    pub fn put(&mut self, request: &Request, response: &Response) -> Result<(), SwError> {
        let entry = CacheEntry::for_storage(request, response)?;
        self.insert(entry);
        Ok(())
    }

    /// Insert a prepared entry.
    pub fn insert(&mut self, entry: CacheEntry) {
        trace!(cache = %self.name, key = %entry.key(), "Cache put");
        self.entries.insert(entry.key(), entry);
    }

    /// Delete the entry for a request.
    pub fn delete(&mut self, request: &Request) -> bool {
        self.entries
            .remove(&cache_key(&request.method, &request.url))
            .is_some()
    }

    /// All stored keys.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==================== Cache Storage ====================

/// All buckets of one origin (`caches` global).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CacheStorage {
    caches: HashMap<String, Cache>,
}

impl CacheStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a cache, creating it if absent.
    pub fn open(&mut self, name: &str) -> &mut Cache {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(name))
    }

    /// Borrow a cache without creating it.
    pub fn get(&self, name: &str) -> Option<&Cache> {
        self.caches.get(name)
    }

    /// Check if cache exists.
    pub fn has(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Delete a cache.
    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    /// Cache names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.keys().cloned().collect();
        names.sort();
        names
    }

    /// Read a snapshot written by [`CacheStorage::save`]; a missing file is empty storage.
    pub fn load(path: &Path) -> Result<Self, SwError> {
        if !path.exists() {
            debug!(path = %path.display(), "No cache snapshot, starting empty");
            return Ok(Self::new());
        }

        let data = std::fs::read(path)
            .map_err(|e| SwError::Storage(format!("read {}: {e}", path.display())))?;
        let storage: Self = serde_json::from_slice(&data)
            .map_err(|e| SwError::Storage(format!("parse {}: {e}", path.display())))?;

        debug!(path = %path.display(), caches = storage.caches.len(), "Loaded cache snapshot");
        Ok(storage)
    }

    /// Write a snapshot, replacing the previous one in a single rename.
    pub fn save(&self, path: &Path) -> Result<(), SwError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SwError::Storage(format!("create {}: {e}", parent.display())))?;
        }

        let data = serde_json::to_vec(self)
            .map_err(|e| SwError::Storage(format!("encode snapshot: {e}")))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data)
            .map_err(|e| SwError::Storage(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| SwError::Storage(format!("rename {}: {e}", path.display())))?;

        debug!(path = %path.display(), caches = self.caches.len(), "Saved cache snapshot");
        Ok(())
    }
}
