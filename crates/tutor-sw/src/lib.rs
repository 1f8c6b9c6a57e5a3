//! # Tutor SW
//!
//! Offline request interception for the Math Tutor web app.
//!
//! ## Features
//!
//! - **Lifecycle**: install, activate, redundant
//! - **Versioned cache**: one named bucket per deployment, stale buckets purged on activation
//! - **Routing**: network-first for same-origin API calls, cache-first for the rest
//! - **Offline fallback**: a self-contained page for failed navigations
//! - **Push and sync**: notifications with actions, background sync by tag
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tutor_net::{Request, StaticNetwork, Url};
//! use tutor_sw::{OfflineWorker, WorkerOptions};
//!
//! let options = WorkerOptions::new(Url::parse("https://tutor.example/")?);
//! let (worker, _events) = OfflineWorker::new(options, Arc::new(StaticNetwork::new()));
//! worker.install().await?;
//! worker.activate().await?;
//!
//! let outcome = worker.handle_fetch(&Request::parse("https://tutor.example/")?).await;
//! outcome.wait_until.settled().await;
//! ```

pub mod cache;
pub mod classify;
pub mod clients;
pub mod fallback;
pub mod lifecycle;
pub mod notify;
pub mod prompt;
pub mod strategy;
pub mod sync;
pub mod worker;

use thiserror::Error;

pub use cache::{cache_key, Cache, CacheEntry, CacheStorage, StoredHeader};
pub use classify::{RequestClassifier, Route, RouteRule, Strategy, UrlPattern};
pub use clients::{Client, ClientId, Clients};
pub use lifecycle::{Lifecycle, WorkerId, WorkerState};
pub use notify::{
    Notification, NotificationClick, NotificationId, NotificationOptions, PushMessage,
    ACTION_CLOSE, ACTION_EXPLORE,
};
pub use prompt::{DeferredPrompt, InstallPromptController, PromptOutcome};
pub use strategy::{ResponseSource, SharedCacheStorage};
pub use sync::{PendingSubmissions, SyncHandler, SyncOutcome};
pub use worker::{
    ActivationReport, FetchOutcome, OfflineWorker, Resolution, WaitUntil, WorkerEvent,
    WorkerOptions,
};

/// Errors raised by the worker.
#[derive(Error, Debug, Clone)]
pub enum SwError {
    #[error("Install failed fetching {url}: {reason}")]
    InstallFailed { url: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("State error: {0}")]
    StateError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sync failed for {tag}: {reason}")]
    SyncFailed { tag: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}
