use askama::Template;

use crate::agent::{self, notification};
use crate::config::AppConfig;

/// Every field is an already JSON-encoded literal.
#[derive(Template)]
#[template(path = "manifest.json", escape = "none")]
pub(crate) struct ManifestTemplate {
    pub(crate) name: String,
    pub(crate) short_name: String,
}

#[derive(Template)]
#[template(path = "sw.js", escape = "none")]
pub(crate) struct ServiceWorkerTemplate {
    pub(crate) cache_name: String,
    pub(crate) precache_urls: String,
    pub(crate) api_prefix: String,
    pub(crate) default_title: String,
    pub(crate) default_body: String,
    pub(crate) empty_push_title: String,
    pub(crate) empty_push_body: String,
    pub(crate) default_icon: String,
    pub(crate) default_badge: String,
    pub(crate) default_url: String,
}

fn json_literal<T: serde::Serialize + ?Sized>(value: &T) -> askama::Result<String> {
    serde_json::to_string(value).map_err(|err| askama::Error::Custom(Box::new(err)))
}

pub(crate) fn render_manifest(config: &AppConfig) -> askama::Result<String> {
    ManifestTemplate {
        name: json_literal(&config.app_name)?,
        short_name: json_literal(&config.short_name)?,
    }
    .render()
}

/// Renders the worker script with the same constants the agent model uses,
/// so the shipped script and the tested state machine cannot drift apart.
pub(crate) fn render_service_worker() -> askama::Result<String> {
    ServiceWorkerTemplate {
        cache_name: json_literal(agent::CACHE_NAME)?,
        precache_urls: json_literal(agent::PRECACHE_URLS)?,
        api_prefix: json_literal(agent::API_PREFIX)?,
        default_title: json_literal(notification::DEFAULT_TITLE)?,
        default_body: json_literal(notification::DEFAULT_BODY)?,
        empty_push_title: json_literal(notification::EMPTY_PUSH_TITLE)?,
        empty_push_body: json_literal(notification::EMPTY_PUSH_BODY)?,
        default_icon: json_literal(notification::DEFAULT_ICON)?,
        default_badge: json_literal(notification::DEFAULT_BADGE)?,
        default_url: json_literal(notification::DEFAULT_URL)?,
    }
    .render()
}
