//! Client cache and notification agent: the logic behind the service worker.
//!
//! The agent owns the versioned cache, picks cache or network per request,
//! renders push messages and routes notification clicks. Browser facilities
//! are reached through the traits in [`host`], which keeps the state machine
//! testable outside a browser. `/sw.js` is rendered from the same constants.

mod fetch;
pub mod host;
pub mod notification;

pub use fetch::{ResponseSource, Served};
pub use host::{
    CacheStorage, FetchError, HostError, Network, NotificationTray, Request, RequestMode, Response,
    WindowClient, WindowClients,
};
pub use notification::{ClickData, Notification, resolve_push};

pub const CACHE_NAME: &str = "task-manager-pwa-cache-v1";
pub const PRECACHE_URLS: &[&str] = &[
    "/",
    "/manifest.json",
    "/icons/icon-192x192.png",
    "/icons/icon-512x512.png",
];
/// Responses under this prefix are never written to the cache.
pub const API_PREFIX: &str = "/api/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
    /// Install failed; this worker will never control a page.
    Redundant,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("worker is {found:?}, expected {expected:?}")]
    WrongState {
        found: Lifecycle,
        expected: Lifecycle,
    },
    #[error("precache of {url} failed: {reason}")]
    Precache { url: String, reason: String },
    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Focused { client_id: String },
    Opened { url: String },
}

pub struct ServiceWorker<H> {
    host: H,
    state: Lifecycle,
}

impl<H> ServiceWorker<H>
where
    H: CacheStorage + Network + WindowClients + NotificationTray,
{
    pub fn new(host: H) -> Self {
        Self {
            host,
            state: Lifecycle::Parsed,
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn expect_state(&self, expected: Lifecycle) -> Result<(), AgentError> {
        if self.state != expected {
            return Err(AgentError::WrongState {
                found: self.state,
                expected,
            });
        }
        Ok(())
    }

    /// Precaches the app shell. Every URL must come back 2xx before anything
    /// is stored; one failure leaves the caches untouched and the worker
    /// redundant.
    pub async fn install(&mut self) -> Result<(), AgentError> {
        self.expect_state(Lifecycle::Parsed)?;
        self.state = Lifecycle::Installing;

        let mut entries = Vec::with_capacity(PRECACHE_URLS.len());
        for url in PRECACHE_URLS {
            let failure = match self.host.fetch(&Request::get(*url)).await {
                Ok(response) if response.ok() => {
                    entries.push((url.to_string(), response));
                    continue;
                }
                Ok(response) => format!("status {}", response.status),
                Err(err) => err.to_string(),
            };
            self.state = Lifecycle::Redundant;
            tracing::warn!(url, reason = %failure, "install aborted");
            return Err(AgentError::Precache {
                url: url.to_string(),
                reason: failure,
            });
        }

        if let Err(err) = self.host.put_all(CACHE_NAME, entries).await {
            self.state = Lifecycle::Redundant;
            return Err(err.into());
        }
        self.state = Lifecycle::Installed;
        tracing::info!(cache = CACHE_NAME, "app shell cached");
        Ok(())
    }

    /// Drops caches from older versions and takes over open pages.
    pub async fn activate(&mut self) -> Result<(), AgentError> {
        self.expect_state(Lifecycle::Installed)?;
        self.state = Lifecycle::Activating;

        for name in self.host.cache_names().await? {
            if name != CACHE_NAME {
                tracing::info!(cache = %name, "clearing old cache");
                self.host.delete_cache(&name).await?;
            }
        }
        self.host.claim().await?;
        self.state = Lifecycle::Activated;
        Ok(())
    }

    /// Install followed by immediate activation, skipping the waiting phase.
    pub async fn start(&mut self) -> Result<(), AgentError> {
        self.install().await?;
        self.activate().await
    }

    pub async fn handle_fetch(&self, request: &Request) -> Result<Served, FetchError> {
        if self.state != Lifecycle::Activated {
            return fetch::passthrough(&self.host, request).await;
        }
        match request.mode {
            RequestMode::Navigate => fetch::network_first(&self.host, request).await,
            RequestMode::Other if request.is_get() => fetch::cache_first(&self.host, request).await,
            RequestMode::Other => fetch::passthrough(&self.host, request).await,
        }
    }

    pub async fn handle_push(&self, data: Option<&[u8]>) -> Result<Notification, AgentError> {
        self.expect_state(Lifecycle::Activated)?;
        let notification = resolve_push(data);
        self.host.show(&notification).await?;
        Ok(notification)
    }

    /// Closes the notification and brings the app to its click target,
    /// reusing an open page on the same path when there is one.
    pub async fn handle_notification_click(
        &self,
        notification: &Notification,
    ) -> Result<ClickOutcome, AgentError> {
        self.host.close(notification.tag.as_deref()).await;

        let target = notification.data.target_url();
        let target_path = notification::url_path(target);
        let existing = self
            .host
            .window_clients()
            .await
            .into_iter()
            .find(|client| notification::url_path(&client.url) == target_path);

        match existing {
            Some(client) => {
                self.host.focus(&client.id).await?;
                Ok(ClickOutcome::Focused {
                    client_id: client.id,
                })
            }
            None => {
                self.host.open_window(target).await?;
                Ok(ClickOutcome::Opened {
                    url: target.to_string(),
                })
            }
        }
    }
}
