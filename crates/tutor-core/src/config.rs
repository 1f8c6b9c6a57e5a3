//! Host configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tutor_sw::{NotificationOptions, WorkerOptions};
use url::Url;

use crate::error::{TutorError, TutorResult};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "tutor-offline.json";

/// Offline host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Origin the worker serves
    pub origin: String,

    /// Application name used for notifications and the offline page
    pub app_name: String,

    /// Current cache version name
    pub cache_name: String,

    /// Assets seeded on install, relative to the origin
    pub precache: Vec<String>,

    /// Same-origin URLs containing this are network-first
    pub api_marker: String,

    /// Background sync tag
    pub sync_tag: String,

    /// Push notification presentation
    pub notification: NotificationOptions,

    /// User agent string
    pub user_agent: String,

    /// Per-request network timeout in seconds
    pub request_timeout_secs: u64,

    /// How long an event is kept alive for its cache writes, in seconds
    pub event_timeout_secs: u64,

    /// Install attempts before giving up
    pub install_attempts: u32,

    /// Directory holding the cache snapshot
    pub cache_dir: PathBuf,

    /// Save the cache snapshot on exit
    pub persist_cache: bool,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000/".to_string(),
            app_name: "Math Tutor".to_string(),
            cache_name: "math-tutor-v1".to_string(),
            precache: vec![
                "/".to_string(),
                "/static/css/tailwind.css".to_string(),
                "/static/js/app.js".to_string(),
                "/static/icons/icon-192x192.png".to_string(),
                "/static/icons/icon-512x512.png".to_string(),
            ],
            api_marker: "/api/".to_string(),
            sync_tag: "background-sync-submissions".to_string(),
            notification: NotificationOptions::default(),
            user_agent: format!("tutor-offline/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            event_timeout_secs: 30,
            install_attempts: 3,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tutor-offline"),
            persist_cache: true,
        }
    }
}

impl OfflineConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tutor-offline")
            .join(CONFIG_FILE_NAME)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> TutorResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load an explicit path, else the default path if present, else defaults
    pub fn discover(explicit: Option<&Path>) -> TutorResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Check every field the worker relies on
    pub fn validate(&self) -> TutorResult<()> {
        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") || origin.host().is_none() {
            return Err(TutorError::config(format!(
                "origin must be an http(s) URL with a host: {}",
                self.origin
            )));
        }
        if self.cache_name.trim().is_empty() {
            return Err(TutorError::config("cache_name is empty"));
        }
        if self.api_marker.is_empty() {
            return Err(TutorError::config("api_marker is empty"));
        }
        for path in &self.precache {
            origin.join(path)?;
        }
        origin.join(&self.notification.open_url)?;
        if self.install_attempts == 0 {
            return Err(TutorError::config("install_attempts must be at least 1"));
        }
        if self.request_timeout_secs == 0 || self.event_timeout_secs == 0 {
            return Err(TutorError::config("timeouts must be positive"));
        }
        Ok(())
    }

    pub fn origin_url(&self) -> TutorResult<Url> {
        Ok(Url::parse(&self.origin)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn event_timeout(&self) -> Duration {
        Duration::from_secs(self.event_timeout_secs)
    }

    /// Where the cache snapshot lives
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join("caches.json")
    }

    /// Settings for one worker version
    pub fn worker_options(&self) -> TutorResult<WorkerOptions> {
        let mut options = WorkerOptions::new(self.origin_url()?);
        options.cache_name = self.cache_name.clone();
        options.precache = self.precache.clone();
        options.api_marker = self.api_marker.clone();
        options.app_name = self.app_name.clone();
        options.sync_tag = self.sync_tag.clone();
        options.notification = self.notification.clone();
        Ok(options)
    }
}
