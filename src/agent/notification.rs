use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_TITLE: &str = "Task Manager PWA";
pub const DEFAULT_BODY: &str = "New update available.";
pub const EMPTY_PUSH_TITLE: &str = "Task Manager";
pub const EMPTY_PUSH_BODY: &str = "You have a new notification.";
pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/icons/icon-96x96.png";
pub const DEFAULT_URL: &str = "/";

/// Data attached to a rendered notification and handed back on click.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub task_id: Option<String>,
}

impl ClickData {
    pub fn target_url(&self) -> &str {
        self.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_URL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: Option<String>,
    pub data: ClickData,
}

fn or_default(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Turns an opaque push message into something renderable. Never fails:
/// undecodable payloads become the body of a default notification, and each
/// field that is missing or not a string falls back on its own.
pub fn resolve_push(data: Option<&[u8]>) -> Notification {
    let message = match data {
        None => json!({ "title": EMPTY_PUSH_TITLE, "body": EMPTY_PUSH_BODY }),
        Some(bytes) => match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::String(text)) => json!({ "body": text }),
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, "push payload is not JSON, using it as text");
                json!({ "body": String::from_utf8_lossy(bytes).trim() })
            }
        },
    };
    let click = message.get("data").unwrap_or(&Value::Null);

    Notification {
        title: or_default(text_field(&message, "title"), DEFAULT_TITLE),
        body: or_default(text_field(&message, "body"), DEFAULT_BODY),
        icon: or_default(text_field(&message, "icon"), DEFAULT_ICON),
        badge: or_default(text_field(&message, "badge"), DEFAULT_BADGE),
        tag: text_field(&message, "tag").filter(|tag| !tag.trim().is_empty()),
        data: ClickData {
            url: text_field(click, "url"),
            timestamp: click.get("timestamp").and_then(Value::as_i64),
            task_id: text_field(click, "taskId"),
        },
    }
}

/// Path component of an absolute or root-relative URL, without query or
/// fragment.
pub(super) fn url_path(url: &str) -> &str {
    let without_origin = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            match rest.find('/') {
                Some(path_start) => &rest[path_start..],
                None => "/",
            }
        }
        None => url,
    };
    let end = without_origin
        .find(['?', '#'])
        .unwrap_or(without_origin.len());
    match &without_origin[..end] {
        "" => "/",
        path => path,
    }
}
