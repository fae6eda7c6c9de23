use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A browser push channel as stored in the `subscriptions` collection.
///
/// Records are unique by `endpoint` and are only ever soft-deleted by
/// flipping `active` to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_used: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// How a single delivery attempt settled, as far as the stored
/// subscription is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The push service rejected the message but the endpoint may recover.
    Transient,
    /// 404 or 410: the endpoint will never accept a message again.
    Gone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    TaskCreated,
    TaskCompleted,
    TaskDeleted,
    TaskDue,
    TestMessage,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::TaskCreated => "task_created",
            NotificationKind::TaskCompleted => "task_completed",
            NotificationKind::TaskDeleted => "task_deleted",
            NotificationKind::TaskDue => "task_due",
            NotificationKind::TestMessage => "test_message",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "task_created" => Some(NotificationKind::TaskCreated),
            "task_completed" => Some(NotificationKind::TaskCompleted),
            "task_deleted" => Some(NotificationKind::TaskDeleted),
            "task_due" => Some(NotificationKind::TaskDue),
            "test_message" => Some(NotificationKind::TestMessage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
}

/// Event description as it arrives from a client. `kind` is left as a raw
/// string so unknown event types can still be rendered generically.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub task: Option<TaskRef>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    TaskCreated(TaskRef),
    TaskCompleted(TaskRef),
    TaskDeleted(TaskRef),
    TaskDue(TaskRef),
    TestMessage { message: Option<String> },
    Generic { kind: String, message: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub url: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub success: bool,
    pub sent: usize,
    pub total: usize,
}

impl DispatchReport {
    pub fn empty() -> Self {
        Self {
            success: false,
            sent: 0,
            total: 0,
        }
    }
}
