use std::path::Path;
use std::sync::Arc;

use crate::adapters::{TokioTimeProvider, WebPushSender};
use crate::config::AppConfig;
use crate::error::ServeError;
use crate::push;
use crate::service::Service;
use crate::store::Store;
use crate::templates;

pub type AppService = Service<WebPushSender, TokioTimeProvider>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub service: Arc<AppService>,
    /// Present only when push delivery is enabled.
    pub public_key: Option<String>,
    pub manifest: Arc<str>,
    pub service_worker: Arc<str>,
    pub icon_192: Option<Arc<[u8]>>,
    pub icon_512: Option<Arc<[u8]>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<Store>) -> Result<Self, ServeError> {
        let sender = push::build_sender(&config);
        let public_key = sender.as_ref().map(|sender| sender.public_key().to_string());
        let service = Service::new(store, TokioTimeProvider, sender);
        let manifest = templates::render_manifest(&config).map_err(ServeError::Template)?;
        let service_worker = templates::render_service_worker().map_err(ServeError::Template)?;
        let icon_192 = config.icon_192.as_deref().and_then(load_icon);
        let icon_512 = config.icon_512.as_deref().and_then(load_icon);

        Ok(Self {
            config,
            service: Arc::new(service),
            public_key,
            manifest: manifest.into(),
            service_worker: service_worker.into(),
            icon_192,
            icon_512,
        })
    }
}

fn load_icon(path: &Path) -> Option<Arc<[u8]>> {
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes.into()),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read icon");
            None
        }
    }
}
