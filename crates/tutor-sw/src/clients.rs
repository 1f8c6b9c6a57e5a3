//! Pages and windows the worker can control (`clients`).

use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use serde::Serialize;
use url::Url;

use crate::lifecycle::WorkerId;

/// Client identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClientId(String);

impl ClientId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(format!("client-{}", COUNTER.fetch_add(1, Ordering::Relaxed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A window client.
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub url: Url,
    pub focused: bool,
    /// Worker controlling this page, if any.
    pub controller: Option<WorkerId>,
}

/// Open window clients.
#[derive(Debug, Default)]
pub struct Clients {
    clients: HashMap<ClientId, Client>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an already-open, uncontrolled page.
    pub fn attach(&mut self, url: Url) -> Client {
        let client = Client {
            id: ClientId::new(),
            url,
            focused: false,
            controller: None,
        };
        self.clients.insert(client.id.clone(), client.clone());
        client
    }

    pub fn get(&self, id: &ClientId) -> Option<&Client> {
        self.clients.get(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Open a new focused window; it is controlled by `controller` from the start.
    pub fn open_window(&mut self, url: Url, controller: Option<WorkerId>) -> Client {
        for other in self.clients.values_mut() {
            other.focused = false;
        }
        let client = Client {
            id: ClientId::new(),
            url,
            focused: true,
            controller,
        };
        self.clients.insert(client.id.clone(), client.clone());
        client
    }

    /// Focus an existing window showing `url`, if there is one.
    pub fn focus_url(&mut self, url: &Url) -> Option<Client> {
        let id = self
            .clients
            .values()
            .find(|c| &c.url == url)
            .map(|c| c.id.clone())?;

        for client in self.clients.values_mut() {
            client.focused = client.id == id;
        }
        self.clients.get(&id).cloned()
    }

    /// Take control of every client under `scope` not already controlled by `worker`.
    ///
    /// Returns the ids whose controller changed.
    pub fn claim(&mut self, worker: WorkerId, scope: &Url) -> Vec<ClientId> {
        self.clients
            .values_mut()
            .filter(|c| c.url.as_str().starts_with(scope.as_str()))
            .filter(|c| c.controller != Some(worker))
            .map(|c| {
                c.controller = Some(worker);
                c.id.clone()
            })
            .collect()
    }

    /// Clients under `scope` that some worker other than `worker` controls.
    pub fn held_by_others(&self, worker: WorkerId, scope: &Url) -> usize {
        self.clients
            .values()
            .filter(|c| c.url.as_str().starts_with(scope.as_str()))
            .filter(|c| c.controller.is_some_and(|w| w != worker))
            .count()
    }

    /// Number of clients controlled by `worker`.
    pub fn controlled_by(&self, worker: WorkerId) -> usize {
        self.clients
            .values()
            .filter(|c| c.controller == Some(worker))
            .count()
    }
}
