//! Due-time reminders.
//!
//! Best effort only: a reminder is a sleeping tokio task. Nothing is written
//! down, so a restart silently drops every pending reminder.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use super::composer::compose;
use super::dispatcher::Dispatcher;
use crate::ports;
use crate::types::push::{NotificationEvent, TaskRef};

/// Tasks due further out than this get no reminder.
pub const REMINDER_WINDOW: time::Duration = time::Duration::hours(24);

struct ReminderHandle {
    task: TaskRef,
    due_at: OffsetDateTime,
    scheduled_at: OffsetDateTime,
    handle: JoinHandle<()>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReminder {
    pub task_id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub due_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
}

pub struct Reminders<S, T> {
    dispatcher: Arc<Dispatcher<S, T>>,
    pending: Mutex<HashMap<String, ReminderHandle>>,
}

impl<S, T> Reminders<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(dispatcher: Arc<Dispatcher<S, T>>) -> Self {
        Self {
            dispatcher,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Arms a `task_due` notification for `due_at` if it falls inside the
    /// reminder window. Replaces any reminder already armed for the task.
    pub fn schedule(&self, task: TaskRef, due_at: OffsetDateTime) -> bool {
        let time = self.dispatcher.time().clone();
        let now = time.now();
        let Some(delay) = reminder_delay(now, due_at) else {
            self.cancel(&task.id);
            tracing::debug!(task_id = %task.id, %due_at, "due date outside reminder window");
            return false;
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        let task_for_reminder = task.clone();
        let handle = tokio::spawn(async move {
            time.sleep(delay).await;
            let task_id = task_for_reminder.id.clone();
            let payload = compose(&NotificationEvent::TaskDue(task_for_reminder), time.now());
            let report = dispatcher.dispatch(&payload).await;
            tracing::info!(
                %task_id,
                sent = report.sent,
                total = report.total,
                "due reminder fired"
            );
        });

        let mut pending = self.pending.lock().expect("reminders lock");
        pending.retain(|_, reminder| !reminder.handle.is_finished());
        let previous = pending.insert(
            task.id.clone(),
            ReminderHandle {
                task,
                due_at,
                scheduled_at: now,
                handle,
            },
        );
        if let Some(previous) = previous {
            previous.handle.abort();
        }
        true
    }

    /// Drops the pending reminder for `task_id`, if any.
    pub fn cancel(&self, task_id: &str) -> bool {
        let mut pending = self.pending.lock().expect("reminders lock");
        match pending.remove(task_id) {
            Some(reminder) => {
                let was_pending = !reminder.handle.is_finished();
                reminder.handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn pending(&self) -> Vec<PendingReminder> {
        let mut pending = self.pending.lock().expect("reminders lock");
        pending.retain(|_, reminder| !reminder.handle.is_finished());
        let mut reminders: Vec<PendingReminder> = pending
            .values()
            .map(|reminder| PendingReminder {
                task_id: reminder.task.id.clone(),
                title: reminder.task.title.clone(),
                due_at: reminder.due_at,
                scheduled_at: reminder.scheduled_at,
            })
            .collect();
        reminders.sort_by_key(|reminder| reminder.due_at);
        reminders
    }
}

impl<S, T> Drop for Reminders<S, T> {
    fn drop(&mut self) {
        if let Ok(pending) = self.pending.get_mut() {
            for reminder in pending.values() {
                reminder.handle.abort();
            }
        }
    }
}

fn reminder_delay(now: OffsetDateTime, due_at: OffsetDateTime) -> Option<Duration> {
    let delay = due_at - now;
    if !delay.is_positive() || delay >= REMINDER_WINDOW {
        return None;
    }
    delay.try_into().ok()
}
