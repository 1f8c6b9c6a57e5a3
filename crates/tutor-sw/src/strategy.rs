//! Resolution strategies.
//!
//! Each strategy maps (request, current bucket, network) to a response (or
//! none) plus the cache writes it wants. Writes are not applied here; the
//! worker spawns them so the caller never waits on storage.

use std::sync::Arc;

use http::StatusCode;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use tutor_net::{Fetch, Request, Response};

use crate::cache::CacheStorage;
use crate::fallback;

/// Cache storage shared by every in-flight event.
pub type SharedCacheStorage = Arc<RwLock<CacheStorage>>;

/// Where a returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Fallback,
}

/// A store the worker should perform after answering.
#[derive(Debug)]
pub struct CacheWrite {
    pub request: Request,
    pub response: Response,
}

/// Result of running a strategy.
#[derive(Debug, Default)]
pub struct StrategyOutcome {
    /// `None` is an empty result: nothing available for this request.
    pub response: Option<(Response, ResponseSource)>,
    pub writes: Vec<CacheWrite>,
}

impl StrategyOutcome {
    fn empty() -> Self {
        Self::default()
    }

    fn respond(response: Response, source: ResponseSource) -> Self {
        Self {
            response: Some((response, source)),
            writes: Vec::new(),
        }
    }

    fn with_write(mut self, request: &Request, response: Response) -> Self {
        self.writes.push(CacheWrite {
            request: request.clone(),
            response,
        });
        self
    }
}

/// Read-only view of the current-version bucket.
#[derive(Clone, Copy)]
pub struct CacheView<'a> {
    storage: &'a SharedCacheStorage,
    name: &'a str,
}

impl<'a> CacheView<'a> {
    pub fn new(storage: &'a SharedCacheStorage, name: &'a str) -> Self {
        Self { storage, name }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Look up a request; the lock is released before returning.
    pub async fn lookup(&self, request: &Request) -> Option<Response> {
        let storage = self.storage.read().await;
        let entry = storage.get(self.name)?.match_request(request)?;
        match entry.to_response() {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(url = %request.url, error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }
}

/// Network-first: live result when reachable, stored copy when not.
///
/// Only a status of exactly 200 is stored.
pub async fn network_first(
    request: &Request,
    cache: CacheView<'_>,
    network: &dyn Fetch,
) -> StrategyOutcome {
    match network.fetch(request).await {
        Ok(response) => {
            if response.status == StatusCode::OK {
                let copy = response.duplicate();
                StrategyOutcome::respond(response, ResponseSource::Network).with_write(request, copy)
            } else {
                debug!(url = %request.url, status = %response.status, "Not caching non-200 response");
                StrategyOutcome::respond(response, ResponseSource::Network)
            }
        }
        Err(e) => {
            debug!(url = %request.url, error = %e, "Network failed, trying cache");
            match cache.lookup(request).await {
                Some(cached) => StrategyOutcome::respond(cached, ResponseSource::Cache),
                None => {
                    warn!(url = %request.url, "Offline with nothing cached");
                    StrategyOutcome::empty()
                }
            }
        }
    }
}

/// Cache-first: stored copy without revalidation, network on a miss.
///
/// A navigation that misses and cannot reach the network gets the offline
/// document; anything else gets an empty result.
pub async fn cache_first(
    request: &Request,
    cache: CacheView<'_>,
    network: &dyn Fetch,
    app_name: &str,
) -> StrategyOutcome {
    if let Some(cached) = cache.lookup(request).await {
        return StrategyOutcome::respond(cached, ResponseSource::Cache);
    }

    match network.fetch(request).await {
        Ok(response) => {
            let copy = response.duplicate();
            StrategyOutcome::respond(response, ResponseSource::Network).with_write(request, copy)
        }
        Err(e) if request.is_navigation() => {
            warn!(url = %request.url, error = %e, "Navigation failed offline, serving fallback");
            StrategyOutcome::respond(
                fallback::offline_document(app_name, &request.url),
                ResponseSource::Fallback,
            )
        }
        Err(e) => {
            debug!(url = %request.url, error = %e, "Subresource unavailable");
            StrategyOutcome::empty()
        }
    }
}
