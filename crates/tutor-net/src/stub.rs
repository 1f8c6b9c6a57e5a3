//! In-memory network used for offline simulation and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderValue, StatusCode};
use tracing::trace;

use crate::{Fetch, NetError, Request, Response};

#[derive(Debug, Clone)]
struct Route {
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: Bytes,
}

/// A network that serves fixed routes, or nothing at all when offline.
///
/// Unknown URLs answer 404, like a real origin server would.
#[derive(Debug)]
pub struct StaticNetwork {
    routes: Mutex<HashMap<String, Route>>,
    online: AtomicBool,
    requests: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl StaticNetwork {
    /// An online network with no routes.
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// A network on which every request fails.
    pub fn offline() -> Self {
        let network = Self::new();
        network.set_online(false);
        network
    }

    /// Serve `body` with `status` for `url`.
    pub fn route(&self, url: &str, status: u16, content_type: &str, body: impl Into<Bytes>) {
        let route = Route {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: HeaderValue::from_str(content_type).ok(),
            body: body.into(),
        };
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), route);
    }

    /// Toggle reachability.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Requests attempted so far, including those that failed offline.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of attempts made for one URL.
    pub fn requests_for(&self, url: &str) -> usize {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    fn respond(&self, request: &Request) -> Result<Response, NetError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.url.to_string());

        if !self.is_online() {
            trace!(url = %request.url, "Static network offline");
            return Err(NetError::Offline);
        }

        let route = self
            .routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(request.url.as_str())
            .cloned();

        let response = match route {
            Some(route) => {
                let mut response =
                    Response::new(request.url.clone(), route.status).with_body(route.body);
                if let Some(content_type) = route.content_type {
                    response = response.with_header(http::header::CONTENT_TYPE, content_type);
                }
                response
            }
            None => Response::new(request.url.clone(), StatusCode::NOT_FOUND),
        };

        Ok(response)
    }
}

impl Default for StaticNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for StaticNetwork {
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, NetError>> {
        Box::pin(async move { self.respond(request) })
    }
}
