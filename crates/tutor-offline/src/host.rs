//! Runs one worker session: install or resume, activate, dispatch events.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::json;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tutor_common::{retry_with_backoff_when, with_timeout, RetryConfig};
use tutor_core::OfflineConfig;
use tutor_net::{Fetch, LoaderConfig, Request, ResourceLoader, StaticNetwork, Url};
use tutor_sw::{
    CacheStorage, Clients, FetchOutcome, NotificationClick, OfflineWorker, PushMessage,
    SharedCacheStorage, SwError, WorkerEvent, WorkerOptions,
};

use crate::args::Args;

pub struct Host {
    config: OfflineConfig,
    options: WorkerOptions,
    network: Arc<dyn Fetch>,
    caches: SharedCacheStorage,
    clients: Arc<RwLock<Clients>>,
    snapshot: Option<PathBuf>,
}

impl Host {
    pub fn new(config: OfflineConfig, args: &Args) -> anyhow::Result<Self> {
        let options = config.worker_options()?;

        let network: Arc<dyn Fetch> = if args.offline {
            info!("Network disabled, every fetch will fail");
            Arc::new(StaticNetwork::offline())
        } else {
            let loader = ResourceLoader::new(LoaderConfig {
                user_agent: config.user_agent.clone(),
                default_timeout: config.request_timeout(),
                ..Default::default()
            })?;
            Arc::new(loader)
        };

        let snapshot = (config.persist_cache && !args.no_persist).then(|| config.snapshot_path());
        let storage = match &snapshot {
            Some(path) => CacheStorage::load(path)
                .with_context(|| format!("loading cache snapshot {}", path.display()))?,
            None => CacheStorage::new(),
        };
        debug!(buckets = ?storage.keys(), "Cache storage ready");

        Ok(Self {
            config,
            options,
            network,
            caches: Arc::new(RwLock::new(storage)),
            clients: Arc::new(RwLock::new(Clients::new())),
            snapshot,
        })
    }

    fn spawn_worker(&self) -> (OfflineWorker, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (worker, events) = OfflineWorker::new(self.options.clone(), Arc::clone(&self.network));
        let worker = worker
            .with_caches(Arc::clone(&self.caches))
            .with_clients(Arc::clone(&self.clients));
        (worker, events)
    }

    /// Resume the committed bucket if there is one, otherwise install with retries.
    ///
    /// A failed install leaves its worker redundant, so every attempt gets a new one.
    /// Only fetch failures are retried.
    async fn install(&self) -> anyhow::Result<(OfflineWorker, mpsc::UnboundedReceiver<WorkerEvent>)> {
        if self.caches.read().await.has(&self.options.cache_name) {
            let (worker, events) = self.spawn_worker();
            worker.install_from_existing().await?;
            info!(cache = %self.options.cache_name, "Resumed installed cache");
            return Ok((worker, events));
        }

        let retry = RetryConfig::default().with_attempts(self.config.install_attempts);
        let retryable = |e: &SwError| matches!(e, SwError::InstallFailed { .. });
        let installed = retry_with_backoff_when(&retry, retryable, |attempt| async move {
            let (worker, events) = self.spawn_worker();
            let seeded = worker.install().await?;
            info!(attempt, seeded, "Installed");
            Ok::<_, SwError>((worker, events))
        })
        .await
        .with_context(|| {
            format!(
                "install of {} failed after {} attempt(s)",
                self.options.cache_name, self.config.install_attempts
            )
        })?;

        Ok(installed)
    }

    pub async fn run(self, args: &Args) -> anyhow::Result<()> {
        let (worker, events) = self.install().await?;
        let printer = print_events(events);

        let report = worker.activate().await?;
        info!(deleted = ?report.deleted, claimed = report.claimed.len(), "Activated");

        for url in &args.navigate {
            let request = Request::navigate(parse_url(url)?);
            self.resolve(&worker, &request, "navigate").await;
        }
        for url in &args.fetch {
            let request = Request::get(parse_url(url)?);
            self.resolve(&worker, &request, "fetch").await;
        }

        let mut last_notification = None;
        if let Some(payload) = &args.push {
            let message = payload.clone().map(PushMessage::text).unwrap_or_default();
            let notification = worker.handle_push(&message).await?;
            emit(json!({ "event": "push", "notification": notification }));
            last_notification = Some(notification.id);
        }

        if let Some(action) = &args.click {
            let Some(id) = last_notification else {
                bail!("--click needs a notification; pass --push as well");
            };
            let click = NotificationClick {
                notification: id,
                action: Some(action.clone()),
            };
            let window = worker.handle_notification_click(&click).await?;
            emit(json!({ "event": "click", "action": action, "window": window }));
        }

        if let Some(tag) = &args.sync {
            let outcome = worker.handle_sync(tag).await?;
            emit(json!({ "event": "sync", "tag": tag, "outcome": format!("{outcome:?}") }));
        }

        if let Some(path) = &self.snapshot {
            self.caches.read().await.save(path)?;
            info!(path = %path.display(), "Saved cache snapshot");
        }

        drop(worker);
        if let Err(e) = printer.await {
            warn!(error = %e, "Event printer stopped");
        }
        Ok(())
    }

    /// Dispatch one fetch event and keep it alive until its writes settle.
    async fn resolve(&self, worker: &OfflineWorker, request: &Request, kind: &str) {
        let outcome = worker.handle_fetch(request).await;

        let mut summary = json!({
            "event": kind,
            "url": request.url.as_str(),
            "strategy": outcome.strategy,
            "source": outcome.source(),
            "status": outcome.response().map(|r| r.status.as_u16()),
            "bytes": outcome.response().map(|r| r.body().len()),
            "passed_through": outcome.is_pass_through(),
        });

        let FetchOutcome { wait_until, .. } = outcome;
        let stored = match with_timeout(self.config.event_timeout(), || wait_until.settled()).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(url = %request.url, error = %e, "Cache writes did not settle");
                0
            }
        };

        summary["stored"] = json!(stored);
        emit(summary);
    }
}

fn parse_url(url: &str) -> anyhow::Result<Url> {
    Url::parse(url).with_context(|| format!("invalid URL: {url}"))
}

fn emit(value: serde_json::Value) {
    println!("{value}");
}

fn print_events(mut events: mpsc::UnboundedReceiver<WorkerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "Worker event");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_sw::{ResponseSource, WorkerState};

    fn config(dir: &tempfile::TempDir) -> OfflineConfig {
        OfflineConfig {
            origin: "https://tutor.example/".into(),
            cache_dir: dir.path().to_path_buf(),
            install_attempts: 1,
            ..Default::default()
        }
    }

    fn offline_args() -> Args {
        Args {
            offline: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_offline_session_resumes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);

        let network = StaticNetwork::new();
        network.route("https://tutor.example/static/js/app.js", 200, "application/javascript", "app()");
        let request = Request::parse("https://tutor.example/static/js/app.js").unwrap();
        let response = network.fetch(&request).await.unwrap();

        let mut storage = CacheStorage::new();
        storage.open("math-tutor-v1").put(&request, &response).unwrap();
        storage.save(&config.snapshot_path()).unwrap();

        let host = Host::new(config, &offline_args()).unwrap();
        let (worker, _events) = host.install().await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Installed);
        worker.activate().await.unwrap();

        let outcome = worker.handle_fetch(&request).await;
        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(outcome.response().unwrap().body().as_ref(), b"app()");
    }

    #[tokio::test]
    async fn test_offline_first_install_fails() {
        let dir = tempfile::tempdir().unwrap();
        let host = Host::new(config(&dir), &offline_args()).unwrap();

        let err = host.install().await.unwrap_err();
        assert!(err.to_string().contains("math-tutor-v1"));
        assert!(!host.caches.read().await.has("math-tutor-v1"));
    }

    #[tokio::test]
    async fn test_no_persist_skips_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            offline: true,
            no_persist: true,
            ..Default::default()
        };
        let host = Host::new(config(&dir), &args).unwrap();
        assert!(host.snapshot.is_none());
    }
}
