//! What the agent needs from the browser: cache storage, the network,
//! window clients and the notification tray.
//!
//! Service workers run on a single thread, so these futures are not `Send`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Same-origin path, optionally with a query string.
    pub url: String,
    pub mode: RequestMode,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            mode: RequestMode::Other,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            mode: RequestMode::Navigate,
        }
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    /// Absolute or root-relative URL of the page.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network request for {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("offline and nothing cached for {0}")]
    Offline(String),
}

#[allow(async_fn_in_trait)]
pub trait CacheStorage {
    async fn cache_names(&self) -> Result<Vec<String>, HostError>;
    async fn delete_cache(&self, name: &str) -> Result<bool, HostError>;
    async fn put(&self, cache: &str, url: &str, response: Response) -> Result<(), HostError>;
    /// Stores every entry or none of them.
    async fn put_all(&self, cache: &str, entries: Vec<(String, Response)>)
    -> Result<(), HostError>;
    /// Looks `url` up across all caches.
    async fn lookup(&self, url: &str) -> Option<Response>;
}

#[allow(async_fn_in_trait)]
pub trait Network {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

#[allow(async_fn_in_trait)]
pub trait WindowClients {
    async fn window_clients(&self) -> Vec<WindowClient>;
    async fn focus(&self, client_id: &str) -> Result<(), HostError>;
    async fn open_window(&self, url: &str) -> Result<(), HostError>;
    /// Takes control of pages opened before this worker activated.
    async fn claim(&self) -> Result<(), HostError>;
}

#[allow(async_fn_in_trait)]
pub trait NotificationTray {
    async fn show(&self, notification: &super::Notification) -> Result<(), HostError>;
    async fn close(&self, tag: Option<&str>);
}
