//! Request classification: which strategy (if any) resolves a request.

use tracing::trace;
use url::{Origin, Url};

/// Resolution strategy for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Live network, cache only when the network is unreachable.
    NetworkFirst,
    /// Stored copy, network only on a miss.
    CacheFirst,
}

/// Classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; the host handles it natively.
    PassThrough,
    /// Intercepted and resolved with the given strategy.
    Intercept(Strategy),
}

/// URL pattern for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// Exact URL match.
    Exact(String),
    /// Prefix match.
    Prefix(String),
    /// Contains substring.
    Contains(String),
}

impl UrlPattern {
    /// Check if a URL matches this pattern.
    pub fn matches(&self, url: &Url) -> bool {
        let url_str = url.as_str();
        match self {
            UrlPattern::Exact(p) => url_str == p,
            UrlPattern::Prefix(p) => url_str.starts_with(p.as_str()),
            UrlPattern::Contains(p) => url_str.contains(p.as_str()),
        }
    }
}

/// A same-origin routing rule.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub pattern: UrlPattern,
    pub strategy: Strategy,
}

/// Decides, before the network is touched, how a request is resolved.
///
/// Order: cross-origin passes through; then rules in insertion order;
/// then cache-first.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    origin: Origin,
    rules: Vec<RouteRule>,
}

impl RequestClassifier {
    /// Classifier for `origin` with no rules (everything same-origin is cache-first).
    pub fn new(origin: &Url) -> Self {
        Self {
            origin: origin.origin(),
            rules: Vec::new(),
        }
    }

    /// Classifier that sends every URL containing `api_marker` network-first.
    pub fn with_api_marker(origin: &Url, api_marker: &str) -> Self {
        let mut classifier = Self::new(origin);
        classifier.add_rule(RouteRule {
            pattern: UrlPattern::Contains(api_marker.to_string()),
            strategy: Strategy::NetworkFirst,
        });
        classifier
    }

    /// Append a rule; earlier rules win.
    pub fn add_rule(&mut self, rule: RouteRule) {
        self.rules.push(rule);
    }

    /// Whether `url` shares scheme, host and port with the worker origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    /// Classify a request URL.
    pub fn classify(&self, url: &Url) -> Route {
        if !self.is_same_origin(url) {
            trace!(url = %url, "Cross-origin, passing through");
            return Route::PassThrough;
        }

        let strategy = self
            .rules
            .iter()
            .find(|rule| rule.pattern.matches(url))
            .map(|rule| rule.strategy)
            .unwrap_or(Strategy::CacheFirst);

        trace!(url = %url, ?strategy, "Classified request");
        Route::Intercept(strategy)
    }
}
