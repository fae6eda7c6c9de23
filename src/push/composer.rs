use time::OffsetDateTime;

use crate::types::push::{
    NotificationData, NotificationEvent, NotificationKind, NotificationPayload, NotificationRequest,
    TaskRef,
};

pub const NOTIFICATION_ICON: &str = "/icons/icon-192x192.png";
pub const NOTIFICATION_BADGE: &str = "/icons/icon-96x96.png";

const DEFAULT_TEST_MESSAGE: &str = "This is a test notification.";
const DEFAULT_GENERIC_MESSAGE: &str = "You have a new update.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("{0} notifications require a task reference")]
    MissingTaskContext(&'static str),
}

impl NotificationEvent {
    /// Validates a client request into a closed event. Unknown types are
    /// kept as generic events so newer clients still get a notification.
    pub fn from_request(request: NotificationRequest) -> Result<Self, ComposeError> {
        let Some(kind) = NotificationKind::from_wire(&request.kind) else {
            tracing::warn!(kind = %request.kind, "unhandled notification type, sending generic");
            return Ok(NotificationEvent::Generic {
                kind: request.kind,
                message: request.message,
            });
        };

        let task = || {
            request
                .task
                .clone()
                .ok_or(ComposeError::MissingTaskContext(kind.as_str()))
        };
        Ok(match kind {
            NotificationKind::TaskCreated => NotificationEvent::TaskCreated(task()?),
            NotificationKind::TaskCompleted => NotificationEvent::TaskCompleted(task()?),
            NotificationKind::TaskDeleted => NotificationEvent::TaskDeleted(task()?),
            NotificationKind::TaskDue => NotificationEvent::TaskDue(task()?),
            NotificationKind::TestMessage => NotificationEvent::TestMessage {
                message: request.message,
            },
        })
    }

    pub fn kind(&self) -> &str {
        match self {
            NotificationEvent::TaskCreated(_) => NotificationKind::TaskCreated.as_str(),
            NotificationEvent::TaskCompleted(_) => NotificationKind::TaskCompleted.as_str(),
            NotificationEvent::TaskDeleted(_) => NotificationKind::TaskDeleted.as_str(),
            NotificationEvent::TaskDue(_) => NotificationKind::TaskDue.as_str(),
            NotificationEvent::TestMessage { .. } => NotificationKind::TestMessage.as_str(),
            NotificationEvent::Generic { kind, .. } => kind,
        }
    }
}

struct Template {
    title: &'static str,
    body: String,
    tag: String,
    url: String,
    task_id: Option<String>,
}

fn task_template(
    task: &TaskRef,
    title: &'static str,
    body: String,
    tag_prefix: &str,
    url: String,
) -> Template {
    Template {
        title,
        body,
        tag: format!("{tag_prefix}-{}", task.id),
        url,
        task_id: Some(task.id.clone()),
    }
}

fn message_or(message: &Option<String>, fallback: &str) -> String {
    message
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Maps an event to the payload shipped to every subscription.
pub fn compose(event: &NotificationEvent, now: OffsetDateTime) -> NotificationPayload {
    let template = match event {
        NotificationEvent::TaskCreated(task) => task_template(
            task,
            "Task Created!",
            format!("New task: \"{}\" has been added.", task.title),
            "task-created",
            format!("/tasks/{}", task.id),
        ),
        NotificationEvent::TaskCompleted(task) => task_template(
            task,
            "Task Completed! 🎉",
            format!("Task \"{}\" has been marked as complete.", task.title),
            "task-completed",
            format!("/tasks/{}", task.id),
        ),
        NotificationEvent::TaskDeleted(task) => task_template(
            task,
            "Task Deleted",
            format!("Task \"{}\" has been removed.", task.title),
            "task-deleted",
            "/tasks".to_string(),
        ),
        NotificationEvent::TaskDue(task) => task_template(
            task,
            "Task Due!",
            format!("Reminder: Task \"{}\" is due.", task.title),
            "task-due",
            format!("/tasks/{}", task.id),
        ),
        NotificationEvent::TestMessage { message } => Template {
            title: "Test Notification",
            body: message_or(message, DEFAULT_TEST_MESSAGE),
            tag: "test-notification".to_string(),
            url: "/".to_string(),
            task_id: None,
        },
        NotificationEvent::Generic { message, .. } => Template {
            title: "Task Manager Update",
            body: message_or(message, DEFAULT_GENERIC_MESSAGE),
            tag: "generic-notification".to_string(),
            url: "/".to_string(),
            task_id: None,
        },
    };

    NotificationPayload {
        title: template.title.to_string(),
        body: template.body,
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_BADGE.to_string(),
        tag: template.tag,
        data: NotificationData {
            url: template.url,
            timestamp: (now.unix_timestamp_nanos() / 1_000_000) as i64,
            kind: event.kind().to_string(),
            task_id: template.task_id,
        },
    }
}
