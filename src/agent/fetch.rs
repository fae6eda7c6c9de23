use super::host::{CacheStorage, FetchError, Network, Request, Response};
use super::{API_PREFIX, CACHE_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    fn network(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
        }
    }

    fn cache(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Cache,
        }
    }
}

/// Pages: try the network, keep a copy of good answers, fall back to the
/// cached app shell when offline.
pub(super) async fn network_first<H>(host: &H, request: &Request) -> Result<Served, FetchError>
where
    H: CacheStorage + Network,
{
    match host.fetch(request).await {
        Ok(response) => {
            if response.ok() {
                remember(host, &request.url, &response).await;
            }
            Ok(Served::network(response))
        }
        Err(err) => {
            tracing::debug!(error = %err, url = %request.url, "navigation offline, serving shell");
            host.lookup("/")
                .await
                .map(Served::cache)
                .ok_or_else(|| FetchError::Offline(request.url.clone()))
        }
    }
}

/// Assets: serve the cached copy when there is one. Network failures are
/// surfaced to the page.
pub(super) async fn cache_first<H>(host: &H, request: &Request) -> Result<Served, FetchError>
where
    H: CacheStorage + Network,
{
    if let Some(cached) = host.lookup(&request.url).await {
        return Ok(Served::cache(cached));
    }
    let response = host.fetch(request).await?;
    if response.ok() && !is_api(&request.url) {
        remember(host, &request.url, &response).await;
    }
    Ok(Served::network(response))
}

pub(super) async fn passthrough<H: Network>(host: &H, request: &Request) -> Result<Served, FetchError> {
    host.fetch(request).await.map(Served::network)
}

async fn remember<H: CacheStorage>(host: &H, url: &str, response: &Response) {
    if let Err(err) = host.put(CACHE_NAME, url, response.clone()).await {
        tracing::debug!(error = %err, url, "failed to cache response");
    }
}

fn is_api(url: &str) -> bool {
    url.starts_with(API_PREFIX)
}
