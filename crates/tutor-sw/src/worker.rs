//! The offline worker: lifecycle events, fetch interception, push and sync.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tutor_net::{Fetch, Request, Response};
use url::Url;

use crate::cache::{CacheEntry, CacheStorage};
use crate::classify::{RequestClassifier, Route, Strategy};
use crate::clients::{Client, ClientId, Clients};
use crate::lifecycle::{Lifecycle, WorkerId, WorkerState};
use crate::notify::{
    Notification, NotificationCenter, NotificationClick, NotificationId, NotificationOptions,
    PushMessage, ACTION_EXPLORE,
};
use crate::strategy::{
    cache_first, network_first, CacheView, CacheWrite, ResponseSource, SharedCacheStorage,
};
use crate::sync::{PendingSubmissions, SyncHandler, SyncOutcome};
use crate::SwError;

// ==================== Options ====================

/// Deployment settings of one worker version.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Origin whose requests are intercepted.
    pub origin: Url,
    /// Pages under this URL are claimed on activation.
    pub scope: Url,
    /// Current bucket name; bumping it is the only invalidation mechanism.
    pub cache_name: String,
    /// Shell assets seeded on install, relative to `origin`.
    pub precache: Vec<String>,
    /// Same-origin URLs containing this are network-first.
    pub api_marker: String,
    /// Used in notification titles and the offline page.
    pub app_name: String,
    /// Background sync tag this worker answers.
    pub sync_tag: String,
    pub notification: NotificationOptions,
    /// Activate at once after install, even while pages are controlled by an older version.
    pub skip_waiting: bool,
}

impl WorkerOptions {
    pub fn new(origin: Url) -> Self {
        let mut scope = origin.clone();
        scope.set_path("/");
        scope.set_query(None);
        scope.set_fragment(None);

        Self {
            origin,
            scope,
            cache_name: "math-tutor-v1".to_string(),
            precache: vec![
                "/".to_string(),
                "/static/css/tailwind.css".to_string(),
                "/static/js/app.js".to_string(),
                "/static/icons/icon-192x192.png".to_string(),
                "/static/icons/icon-512x512.png".to_string(),
            ],
            api_marker: "/api/".to_string(),
            app_name: "Math Tutor".to_string(),
            sync_tag: "background-sync-submissions".to_string(),
            notification: NotificationOptions::default(),
            skip_waiting: true,
        }
    }

    /// Resolve a path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, SwError> {
        self.origin
            .join(path)
            .map_err(|e| SwError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Absolute manifest URLs.
    pub fn precache_urls(&self) -> Result<Vec<Url>, SwError> {
        self.precache.iter().map(|p| self.resolve(p)).collect()
    }
}

// ==================== Events ====================

/// Notifications emitted to the host.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    StateChange {
        worker_id: WorkerId,
        new_state: WorkerState,
    },
    CacheDeleted {
        name: String,
    },
    ControllerChange {
        client_id: ClientId,
        worker_id: WorkerId,
    },
    NotificationShown {
        id: NotificationId,
    },
    NotificationClosed {
        id: NotificationId,
    },
    WindowOpened {
        client_id: ClientId,
        url: Url,
    },
}

// ==================== Fetch results ====================

/// How an intercepted request was answered.
#[derive(Debug)]
pub enum Resolution {
    /// Not intercepted; the host performs its default handling.
    PassThrough,
    /// Answered by the worker.
    Respond {
        response: Response,
        source: ResponseSource,
    },
    /// Intercepted but nothing is available. The page must treat this as an error.
    Empty,
}

/// Keep-alive token for the cache writes an event started.
///
/// The host keeps the event alive until [`WaitUntil::settled`] resolves.
/// Dropping it does not cancel the writes.
#[derive(Debug, Default)]
pub struct WaitUntil {
    tasks: Vec<JoinHandle<bool>>,
}

impl WaitUntil {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every write; returns how many were stored.
    pub async fn settled(self) -> usize {
        let mut stored = 0;
        for task in self.tasks {
            match task.await {
                Ok(true) => stored += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Cache write task aborted"),
            }
        }
        stored
    }
}

/// Result of one fetch event.
#[derive(Debug)]
pub struct FetchOutcome {
    pub resolution: Resolution,
    /// Strategy used, `None` when passed through.
    pub strategy: Option<Strategy>,
    pub wait_until: WaitUntil,
}

impl FetchOutcome {
    fn pass_through() -> Self {
        Self {
            resolution: Resolution::PassThrough,
            strategy: None,
            wait_until: WaitUntil::default(),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self.resolution, Resolution::PassThrough)
    }

    pub fn response(&self) -> Option<&Response> {
        match &self.resolution {
            Resolution::Respond { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match &self.resolution {
            Resolution::Respond { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Summary of an activation.
#[derive(Debug, Clone, Default)]
pub struct ActivationReport {
    /// Stale buckets removed.
    pub deleted: Vec<String>,
    /// Clients that switched to this worker.
    pub claimed: Vec<ClientId>,
}

// ==================== Worker ====================

/// One version of the offline worker.
pub struct OfflineWorker {
    id: WorkerId,
    options: WorkerOptions,
    classifier: RequestClassifier,
    lifecycle: RwLock<Lifecycle>,
    network: Arc<dyn Fetch>,
    caches: SharedCacheStorage,
    clients: Arc<RwLock<Clients>>,
    notifications: RwLock<NotificationCenter>,
    sync_handler: Arc<dyn SyncHandler>,
    event_tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl OfflineWorker {
    /// Create a worker with fresh storage and no clients.
    pub fn new(
        options: WorkerOptions,
        network: Arc<dyn Fetch>,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let classifier = RequestClassifier::with_api_marker(&options.origin, &options.api_marker);

        (
            Self {
                id: WorkerId::new(),
                options,
                classifier,
                lifecycle: RwLock::new(Lifecycle::new()),
                network,
                caches: Arc::new(RwLock::new(CacheStorage::new())),
                clients: Arc::new(RwLock::new(Clients::new())),
                notifications: RwLock::new(NotificationCenter::default()),
                sync_handler: Arc::new(PendingSubmissions),
                event_tx,
            },
            event_rx,
        )
    }

    /// Share cache storage with earlier worker versions.
    pub fn with_caches(mut self, caches: SharedCacheStorage) -> Self {
        self.caches = caches;
        self
    }

    /// Share the set of open pages.
    pub fn with_clients(mut self, clients: Arc<RwLock<Clients>>) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_sync_handler(mut self, handler: Arc<dyn SyncHandler>) -> Self {
        self.sync_handler = handler;
        self
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    pub fn caches(&self) -> SharedCacheStorage {
        Arc::clone(&self.caches)
    }

    pub fn clients(&self) -> Arc<RwLock<Clients>> {
        Arc::clone(&self.clients)
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state()
    }

    /// Notifications currently shown by this worker.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.shown().to_vec()
    }

    async fn set_state(&self, state: WorkerState) -> Result<(), SwError> {
        self.lifecycle.write().await.transition(state)?;
        info!(worker = self.id.raw(), %state, "Worker state changed");
        let _ = self.event_tx.send(WorkerEvent::StateChange {
            worker_id: self.id,
            new_state: state,
        });
        Ok(())
    }

    // ---------- install / activate ----------

    /// Seed the current bucket with every manifest URL, all or nothing.
    ///
    /// On success the worker skips waiting unless `skip_waiting` is off.
    /// On failure it becomes redundant and nothing is written.
    pub async fn install(&self) -> Result<usize, SwError> {
        self.set_state(WorkerState::Installing).await?;

        let entries = match self.fetch_manifest().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(worker = self.id.raw(), error = %e, "Install failed");
                self.set_state(WorkerState::Redundant).await?;
                return Err(e);
            }
        };

        let seeded = entries.len();
        {
            let mut storage = self.caches.write().await;
            let cache = storage.open(&self.options.cache_name);
            for entry in entries {
                cache.insert(entry);
            }
        }
        info!(cache = %self.options.cache_name, seeded, "Precache seeded");

        self.finish_install().await?;
        Ok(seeded)
    }

    async fn finish_install(&self) -> Result<(), SwError> {
        if self.options.skip_waiting {
            self.lifecycle.write().await.skip_waiting();
        }
        self.set_state(WorkerState::Installed).await
    }

    async fn fetch_manifest(&self) -> Result<Vec<CacheEntry>, SwError> {
        let urls = self.options.precache_urls()?;

        let fetches = urls.into_iter().map(|url| async move {
            let request = Request::get(url);
            let response =
                self.network
                    .fetch(&request)
                    .await
                    .map_err(|e| SwError::InstallFailed {
                        url: request.url.to_string(),
                        reason: e.to_string(),
                    })?;

            if !response.ok() {
                return Err(SwError::InstallFailed {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }

            debug!(url = %request.url, "Fetched precache asset");
            CacheEntry::for_storage(&request, &response)
        });

        try_join_all(fetches).await
    }

    /// Adopt a bucket committed by an earlier session of this same version.
    pub async fn install_from_existing(&self) -> Result<(), SwError> {
        if !self.caches.read().await.has(&self.options.cache_name) {
            return Err(SwError::NotFound(format!(
                "cache {} was never installed",
                self.options.cache_name
            )));
        }
        self.finish_install().await?;
        debug!(cache = %self.options.cache_name, "Resumed existing install");
        Ok(())
    }

    /// Delete every stale bucket, then claim open pages.
    ///
    /// A worker that did not skip waiting stays installed while any page in
    /// scope is still controlled by another worker.
    pub async fn activate(&self) -> Result<ActivationReport, SwError> {
        if !self.lifecycle.read().await.skips_waiting() {
            let held = self
                .clients
                .read()
                .await
                .held_by_others(self.id, &self.options.scope);
            if held > 0 {
                debug!(worker = self.id.raw(), held, "Waiting for older pages to close");
                return Err(SwError::StateError(format!(
                    "waiting: {held} page(s) still controlled by another worker"
                )));
            }
        }

        self.set_state(WorkerState::Activating).await?;

        let deleted = {
            let mut storage = self.caches.write().await;
            let stale: Vec<String> = storage
                .keys()
                .into_iter()
                .filter(|name| *name != self.options.cache_name)
                .collect();
            for name in &stale {
                storage.delete(name);
            }
            stale
        };
        for name in &deleted {
            info!(cache = %name, "Deleted stale cache");
            let _ = self
                .event_tx
                .send(WorkerEvent::CacheDeleted { name: name.clone() });
        }

        let claimed = self.clients.write().await.claim(self.id, &self.options.scope);
        for client_id in &claimed {
            let _ = self.event_tx.send(WorkerEvent::ControllerChange {
                client_id: client_id.clone(),
                worker_id: self.id,
            });
        }

        self.set_state(WorkerState::Activated).await?;
        Ok(ActivationReport { deleted, claimed })
    }

    // ---------- fetch ----------

    /// Resolve an intercepted request.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if !self.state().await.can_intercept_fetch() {
            return FetchOutcome::pass_through();
        }

        let strategy = match self.classifier.classify(&request.url) {
            Route::PassThrough => return FetchOutcome::pass_through(),
            Route::Intercept(strategy) => strategy,
        };

        let view = CacheView::new(&self.caches, &self.options.cache_name);
        let outcome = match strategy {
            Strategy::NetworkFirst => network_first(request, view, self.network.as_ref()).await,
            Strategy::CacheFirst => {
                cache_first(request, view, self.network.as_ref(), &self.options.app_name).await
            }
        };

        let resolution = match outcome.response {
            Some((response, source)) => Resolution::Respond { response, source },
            None => Resolution::Empty,
        };

        debug!(url = %request.url, ?strategy, writes = outcome.writes.len(), "Fetch resolved");

        FetchOutcome {
            resolution,
            strategy: Some(strategy),
            wait_until: self.spawn_writes(outcome.writes),
        }
    }

    fn spawn_writes(&self, writes: Vec<CacheWrite>) -> WaitUntil {
        let tasks = writes
            .into_iter()
            .map(|write| {
                let caches = Arc::clone(&self.caches);
                let name = self.options.cache_name.clone();
                tokio::spawn(async move {
                    let mut storage = caches.write().await;
                    match storage.open(&name).put(&write.request, &write.response) {
                        Ok(()) => true,
                        Err(e) => {
                            debug!(url = %write.request.url, error = %e, "Response not stored");
                            false
                        }
                    }
                })
            })
            .collect();

        WaitUntil { tasks }
    }

    // ---------- sync / push ----------

    async fn require_active(&self, what: &str) -> Result<(), SwError> {
        let state = self.state().await;
        if state.can_intercept_fetch() {
            Ok(())
        } else {
            Err(SwError::StateError(format!("{what} delivered to {state} worker")))
        }
    }

    /// Handle a background sync event.
    pub async fn handle_sync(&self, tag: &str) -> Result<SyncOutcome, SwError> {
        self.require_active("sync").await?;

        if tag != self.options.sync_tag {
            debug!(tag, "Ignoring unknown sync tag");
            return Ok(SyncOutcome::Ignored);
        }

        self.sync_handler.sync(tag).await?;
        Ok(SyncOutcome::Completed)
    }

    /// Show exactly one notification for a push message.
    pub async fn handle_push(&self, message: &PushMessage) -> Result<Notification, SwError> {
        self.require_active("push").await?;

        let notification =
            Notification::for_push(&self.options.app_name, &self.options.notification, message);
        self.notifications.write().await.show(notification.clone());

        info!(id = ?notification.id, body = %notification.body, "Notification shown");
        let _ = self.event_tx.send(WorkerEvent::NotificationShown {
            id: notification.id,
        });
        Ok(notification)
    }

    /// Close the clicked notification; the explore action brings up the app route.
    ///
    /// Returns the focused or newly opened window, if any.
    pub async fn handle_notification_click(
        &self,
        click: &NotificationClick,
    ) -> Result<Option<Client>, SwError> {
        if self.notifications.write().await.close(click.notification) {
            let _ = self.event_tx.send(WorkerEvent::NotificationClosed {
                id: click.notification,
            });
        }

        if click.action.as_deref() != Some(ACTION_EXPLORE) {
            return Ok(None);
        }

        let url = self.options.resolve(&self.options.notification.open_url)?;
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.focus_url(&url) {
            debug!(client = %client.id, "Focused existing window");
            return Ok(Some(client));
        }

        let client = clients.open_window(url.clone(), Some(self.id));
        let _ = self.event_tx.send(WorkerEvent::WindowOpened {
            client_id: client.id.clone(),
            url,
        });
        Ok(Some(client))
    }
}

impl std::fmt::Debug for OfflineWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineWorker")
            .field("id", &self.id)
            .field("cache_name", &self.options.cache_name)
            .field("origin", &self.options.origin.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use tutor_net::StaticNetwork;

    const ORIGIN: &str = "https://tutor.example/";

    fn options() -> WorkerOptions {
        let mut options = WorkerOptions::new(Url::parse(ORIGIN).unwrap());
        options.precache = vec!["/".into(), "/static/js/app.js".into()];
        options
    }

    fn network() -> Arc<StaticNetwork> {
        let network = StaticNetwork::new();
        network.route(ORIGIN, 200, "text/html", "<html>home</html>");
        network.route(
            "https://tutor.example/static/js/app.js",
            200,
            "application/javascript",
            "app()",
        );
        Arc::new(network)
    }

    async fn active_worker() -> (OfflineWorker, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (worker, rx) = OfflineWorker::new(options(), network());
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        (worker, rx)
    }

    #[test]
    fn test_options_defaults() {
        let options = WorkerOptions::new(Url::parse("https://tutor.example/app/?x=1").unwrap());
        assert_eq!(options.scope.as_str(), "https://tutor.example/");
        assert_eq!(options.cache_name, "math-tutor-v1");
        assert_eq!(options.precache.len(), 5);
        assert_eq!(
            options.precache_urls().unwrap()[1].as_str(),
            "https://tutor.example/static/css/tailwind.css"
        );
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let (worker, mut rx) = active_worker().await;
        assert_eq!(worker.state().await, WorkerState::Activated);

        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let WorkerEvent::StateChange { new_state, .. } = event {
                states.push(new_state);
            }
        }
        assert_eq!(
            states,
            vec![
                WorkerState::Installing,
                WorkerState::Installed,
                WorkerState::Activating,
                WorkerState::Activated
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let (worker, _rx) = OfflineWorker::new(options(), network());
        worker.install().await.unwrap();

        let request = Request::parse("https://tutor.example/static/js/app.js").unwrap();
        assert!(worker.handle_fetch(&request).await.is_pass_through());
    }

    #[tokio::test]
    async fn test_install_twice_is_state_error() {
        let (worker, _rx) = active_worker().await;
        assert!(matches!(
            worker.install().await,
            Err(SwError::StateError(_))
        ));
    }

    #[tokio::test]
    async fn test_install_from_existing_requires_bucket() {
        let (worker, _rx) = OfflineWorker::new(options(), Arc::new(StaticNetwork::offline()));
        assert!(matches!(
            worker.install_from_existing().await,
            Err(SwError::NotFound(_))
        ));

        worker.caches().write().await.open("math-tutor-v1");
        worker.install_from_existing().await.unwrap();
        worker.activate().await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_claims_clients_in_scope() {
        let clients = Arc::new(RwLock::new(Clients::new()));
        clients
            .write()
            .await
            .attach(Url::parse("https://tutor.example/student/home").unwrap());

        let (worker, _rx) = OfflineWorker::new(options(), network());
        let worker = worker.with_clients(Arc::clone(&clients));
        worker.install().await.unwrap();
        let report = worker.activate().await.unwrap();

        assert_eq!(report.claimed.len(), 1);
        assert_eq!(clients.read().await.controlled_by(worker.id()), 1);
    }

    #[tokio::test]
    async fn test_waiting_worker_stays_installed_while_old_pages_open() {
        let clients = Arc::new(RwLock::new(Clients::new()));
        let (old, _old_rx) = OfflineWorker::new(options(), network());
        let old = old.with_clients(Arc::clone(&clients));
        old.install().await.unwrap();
        old.activate().await.unwrap();
        clients
            .write()
            .await
            .open_window(Url::parse("https://tutor.example/student/home").unwrap(), Some(old.id()));

        let mut waiting = options();
        waiting.cache_name = "math-tutor-v2".into();
        waiting.skip_waiting = false;
        let (new, _new_rx) = OfflineWorker::new(waiting, network());
        let new = new
            .with_caches(old.caches())
            .with_clients(Arc::clone(&clients));
        new.install().await.unwrap();

        assert!(matches!(new.activate().await, Err(SwError::StateError(_))));
        assert_eq!(new.state().await, WorkerState::Installed);
        assert_eq!(clients.read().await.controlled_by(old.id()), 1);
        assert!(old.caches().read().await.has("math-tutor-v1"));
    }

    #[tokio::test]
    async fn test_waiting_worker_activates_without_old_pages() {
        let clients = Arc::new(RwLock::new(Clients::new()));
        clients
            .write()
            .await
            .attach(Url::parse("https://tutor.example/student/home").unwrap());

        let mut waiting = options();
        waiting.skip_waiting = false;
        let (worker, _rx) = OfflineWorker::new(waiting, network());
        let worker = worker.with_clients(Arc::clone(&clients));
        worker.install().await.unwrap();

        let report = worker.activate().await.unwrap();
        assert_eq!(report.claimed.len(), 1);
        assert_eq!(worker.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_skip_waiting_takes_over_old_pages() {
        let clients = Arc::new(RwLock::new(Clients::new()));
        let (old, _old_rx) = OfflineWorker::new(options(), network());
        let old = old.with_clients(Arc::clone(&clients));
        old.install().await.unwrap();
        old.activate().await.unwrap();
        clients
            .write()
            .await
            .open_window(Url::parse("https://tutor.example/student/home").unwrap(), Some(old.id()));

        let mut next = options();
        next.cache_name = "math-tutor-v2".into();
        let (new, _new_rx) = OfflineWorker::new(next, network());
        let new = new
            .with_caches(old.caches())
            .with_clients(Arc::clone(&clients));
        new.install().await.unwrap();

        let report = new.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["math-tutor-v1".to_string()]);
        assert_eq!(report.claimed.len(), 1);
        assert_eq!(clients.read().await.controlled_by(old.id()), 0);
    }

    struct FailingSync;

    impl SyncHandler for FailingSync {
        fn sync<'a>(&'a self, tag: &'a str) -> BoxFuture<'a, Result<(), SwError>> {
            Box::pin(async move {
                Err(SwError::SyncFailed {
                    tag: tag.to_string(),
                    reason: "server rejected batch".into(),
                })
            })
        }
    }

    #[tokio::test]
    async fn test_sync_routes_by_tag() {
        let (worker, _rx) = active_worker().await;

        assert_eq!(
            worker.handle_sync("background-sync-submissions").await.unwrap(),
            SyncOutcome::Completed
        );
        assert_eq!(
            worker.handle_sync("something-else").await.unwrap(),
            SyncOutcome::Ignored
        );

        let worker = worker.with_sync_handler(Arc::new(FailingSync));
        assert!(matches!(
            worker.handle_sync("background-sync-submissions").await,
            Err(SwError::SyncFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_sync_requires_active_worker() {
        let (worker, _rx) = OfflineWorker::new(options(), network());
        assert!(matches!(
            worker.handle_sync("background-sync-submissions").await,
            Err(SwError::StateError(_))
        ));
    }

    #[tokio::test]
    async fn test_each_push_shows_one_notification() {
        let (worker, _rx) = active_worker().await;

        worker.handle_push(&PushMessage::default()).await.unwrap();
        worker
            .handle_push(&PushMessage::text("Quiz graded"))
            .await
            .unwrap();

        let shown = worker.notifications().await;
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].title, "Math Tutor");
        assert_eq!(shown[1].body, "Quiz graded");
    }

    #[tokio::test]
    async fn test_explore_click_opens_then_focuses() {
        let (worker, _rx) = active_worker().await;
        let notification = worker.handle_push(&PushMessage::default()).await.unwrap();

        let click = NotificationClick {
            notification: notification.id,
            action: Some(ACTION_EXPLORE.to_string()),
        };
        let opened = worker.handle_notification_click(&click).await.unwrap().unwrap();
        assert_eq!(opened.url.as_str(), "https://tutor.example/student/home");
        assert_eq!(opened.controller, Some(worker.id()));
        assert!(worker.notifications().await.is_empty());

        let again = worker.handle_notification_click(&click).await.unwrap().unwrap();
        assert_eq!(again.id, opened.id);
        assert_eq!(worker.clients().read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_close_click_only_closes() {
        let (worker, _rx) = active_worker().await;
        let notification = worker.handle_push(&PushMessage::default()).await.unwrap();

        let click = NotificationClick {
            notification: notification.id,
            action: Some("close".to_string()),
        };
        assert!(worker.handle_notification_click(&click).await.unwrap().is_none());
        assert!(worker.notifications().await.is_empty());
        assert!(worker.clients().read().await.is_empty());
    }
}
