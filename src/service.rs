//! The operations behind the client-facing API.
//!
//! Task mutations are written to the store first; the notifications they
//! trigger are best effort and can never fail the mutation itself.

mod validate;

use std::sync::Arc;

use crate::error::ServiceError;
use crate::ports;
use crate::push::{Dispatcher, PendingReminder, Reminders, compose};
use crate::store::Store;
use crate::types::push::{
    DispatchReport, NotificationEvent, NotificationRequest, Subscription, SubscriptionRequest,
};
use crate::types::task::{NewTask, Task, TaskPatch, TaskStats};

struct PushChannel<S, T> {
    dispatcher: Arc<Dispatcher<S, T>>,
    reminders: Reminders<S, T>,
}

pub struct Service<S, T> {
    store: Arc<Store>,
    time: T,
    push: Option<PushChannel<S, T>>,
}

impl<S, T> Service<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    /// Without a sender every notification resolves to an empty report.
    pub fn new(store: Arc<Store>, time: T, sender: Option<S>) -> Self {
        let push = sender.map(|sender| {
            let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&store), sender, time.clone()));
            PushChannel {
                reminders: Reminders::new(Arc::clone(&dispatcher)),
                dispatcher,
            }
        });
        Self { store, time, push }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn push_enabled(&self) -> bool {
        self.push.is_some()
    }

    pub fn subscribe(&self, request: SubscriptionRequest) -> Result<Subscription, ServiceError> {
        let keys = validate::validate_subscription(&request)?;
        let subscription = self.store.subscriptions().upsert_by_endpoint(
            request.endpoint.trim(),
            keys,
            request.user_agent,
            self.time.now(),
        )?;
        tracing::info!(endpoint = %subscription.endpoint, "subscription saved");
        Ok(subscription)
    }

    /// Deactivates one subscription. A missing endpoint is rejected; bulk
    /// deactivation is a separate store operation.
    pub fn unsubscribe(&self, endpoint: Option<&str>) -> Result<(), ServiceError> {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or(ServiceError::MissingEndpoint)?;
        if !self.store.subscriptions().deactivate(endpoint)? {
            return Err(ServiceError::NotFound {
                kind: "subscription",
                id: endpoint.to_string(),
            });
        }
        tracing::info!(endpoint, "subscription deactivated");
        Ok(())
    }

    pub async fn notify(&self, request: NotificationRequest) -> Result<DispatchReport, ServiceError> {
        let event = NotificationEvent::from_request(request)?;
        Ok(self.send(event).await)
    }

    async fn send(&self, event: NotificationEvent) -> DispatchReport {
        let Some(push) = self.push.as_ref() else {
            tracing::debug!(kind = event.kind(), "push disabled, notification dropped");
            return DispatchReport::empty();
        };
        let payload = compose(&event, self.time.now());
        push.dispatcher.dispatch(&payload).await
    }

    pub async fn create_task(&self, input: NewTask) -> Result<Task, ServiceError> {
        let now = self.time.now();
        let valid = validate::validate_new_task(input, now)?;
        let task = Task {
            id: new_task_id(),
            title: valid.title,
            description: valid.description,
            due_date: valid.due_date,
            priority: valid.priority,
            tags: valid.tags,
            completed: false,
            created_at: now,
            completed_at: None,
        };
        self.store.tasks().insert(task.clone())?;
        tracing::info!(task_id = %task.id, "task created");

        self.send(NotificationEvent::TaskCreated(task.task_ref()))
            .await;
        if let Some(push) = self.push.as_ref() {
            push.reminders.schedule(task.task_ref(), task.due_date);
        }
        Ok(task)
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.store.tasks().list()
    }

    pub fn get_task(&self, id: &str) -> Result<Task, ServiceError> {
        self.store
            .tasks()
            .get(id)
            .ok_or_else(|| ServiceError::task_not_found(id))
    }

    /// Marks the task completed. Completing it again returns it unchanged
    /// and sends nothing.
    pub async fn complete_task(&self, id: &str) -> Result<Task, ServiceError> {
        let now = self.time.now();
        let (task, transitioned) = self
            .store
            .tasks()
            .modify(id, |task| task.mark_completed(now))?
            .ok_or_else(|| ServiceError::task_not_found(id))?;
        if !transitioned {
            return Ok(task);
        }
        tracing::info!(task_id = %task.id, "task completed");

        if let Some(push) = self.push.as_ref() {
            push.reminders.cancel(&task.id);
        }
        self.send(NotificationEvent::TaskCompleted(task.task_ref()))
            .await;
        Ok(task)
    }

    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task, ServiceError> {
        let valid = validate::validate_patch(patch, self.time.now())?;
        // Reminders carry the title, so a rename re-arms them too.
        let rescheduled = valid.due_date.is_some() || valid.title.is_some();
        let (task, ()) = self
            .store
            .tasks()
            .modify(id, |task| {
                if let Some(title) = valid.title {
                    task.title = title;
                }
                if let Some(description) = valid.description {
                    task.description = description;
                }
                if let Some(due_date) = valid.due_date {
                    task.due_date = due_date;
                }
                if let Some(priority) = valid.priority {
                    task.priority = priority;
                }
                if let Some(tags) = valid.tags {
                    task.tags = tags;
                }
            })?
            .ok_or_else(|| ServiceError::task_not_found(id))?;

        if rescheduled
            && !task.completed
            && let Some(push) = self.push.as_ref()
        {
            push.reminders.schedule(task.task_ref(), task.due_date);
        }
        Ok(task)
    }

    /// Removes the task and its pending reminder. No notification is sent.
    pub fn delete_task(&self, id: &str) -> Result<Task, ServiceError> {
        let task = self
            .store
            .tasks()
            .remove(id)?
            .ok_or_else(|| ServiceError::task_not_found(id))?;
        if let Some(push) = self.push.as_ref() {
            push.reminders.cancel(&task.id);
        }
        tracing::info!(task_id = %task.id, "task deleted");
        Ok(task)
    }

    pub fn task_stats(&self) -> TaskStats {
        self.store.tasks().stats(self.time.now())
    }

    pub fn pending_reminders(&self) -> Vec<PendingReminder> {
        self.push
            .as_ref()
            .map(|push| push.reminders.pending())
            .unwrap_or_default()
    }
}

fn new_task_id() -> String {
    let bytes: [u8; 12] = rand::random();
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::push::vapid::generate_vapid_credentials_with_rng;
    use crate::store::{TASKS_FILE, create_temp_dir};
    use crate::testing::{TestSender, TestTime, fixed_now, seed_subscription};
    use crate::types::push::SubscriptionKeys;
    use base64::{STANDARD, URL_SAFE_NO_PAD, decode_config, encode_config};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn service_with(sender: &TestSender, time: &TestTime) -> Service<TestSender, TestTime> {
        let store = Arc::new(Store::in_memory());
        seed_subscription(&store, "https://push.example/123");
        Service::new(store, time.clone(), Some(sender.clone()))
    }

    fn new_task(title: &str, due_in: time::Duration) -> NewTask {
        let due = fixed_now() + due_in;
        NewTask {
            title: title.to_string(),
            due_date: Some(
                due.format(&time::format_description::well_known::Rfc3339)
                    .expect("format due date"),
            ),
            ..NewTask::default()
        }
    }

    fn sent_tags(sender: &TestSender) -> Vec<String> {
        sender
            .sent()
            .iter()
            .map(|(_, payload)| {
                let json: serde_json::Value = serde_json::from_str(payload).expect("payload json");
                json["tag"].as_str().expect("tag").to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn create_task__should_store_notify_and_arm_reminder() {
        // Given
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);

        // When
        let task = service
            .create_task(new_task("Buy milk", time::Duration::hours(2)))
            .await
            .expect("create task");

        // Then
        assert_eq!(task.id.len(), 24);
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(service.list_tasks(), vec![task.clone()]);
        assert_eq!(sent_tags(&sender), vec![format!("task-created-{}", task.id)]);
        let reminders = service.pending_reminders();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].task_id, task.id);
    }

    #[tokio::test]
    async fn create_task__should_not_arm_reminder_beyond_a_day() {
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);

        service
            .create_task(new_task("Plan trip", time::Duration::days(3)))
            .await
            .expect("create task");

        assert!(service.pending_reminders().is_empty());
    }

    #[tokio::test]
    async fn create_task__should_reject_invalid_input_without_side_effects() {
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);

        let result = service
            .create_task(new_task("", -time::Duration::hours(1)))
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(service.list_tasks().is_empty());
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn complete_task__should_set_completed_at_exactly_once() {
        // Given
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);
        let task = service
            .create_task(new_task("Buy milk", time::Duration::hours(2)))
            .await
            .expect("create task");

        // When
        let first = service.complete_task(&task.id).await.expect("complete");
        time.advance_and_wake(time::Duration::minutes(10));
        let second = service.complete_task(&task.id).await.expect("complete again");

        // Then
        assert!(first.completed);
        assert_eq!(first.completed_at, Some(fixed_now()));
        assert_eq!(second.completed_at, Some(fixed_now()));
        assert!(service.pending_reminders().is_empty());
        assert_eq!(
            sent_tags(&sender),
            vec![
                format!("task-created-{}", task.id),
                format!("task-completed-{}", task.id),
            ]
        );
    }

    #[tokio::test]
    async fn complete_task__should_fail_for_unknown_task() {
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);

        let result = service.complete_task("missing").await;

        assert!(matches!(result, Err(ServiceError::NotFound { kind: "task", .. })));
    }

    #[tokio::test]
    async fn update_task__should_patch_fields_and_keep_completion_state() {
        // Given
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);
        let task = service
            .create_task(new_task("Buy milk", time::Duration::days(2)))
            .await
            .expect("create task");
        let patch = TaskPatch {
            title: Some("Buy oat milk".to_string()),
            due_date: Some("2025-01-12T12:00:00Z".to_string()),
            tags: Some(vec!["shopping".to_string()]),
            ..TaskPatch::default()
        };

        // When
        let updated = service.update_task(&task.id, patch).await.expect("update");

        // Then
        assert_eq!(updated.title, "Buy oat milk");
        assert_eq!(updated.tags, vec!["shopping".to_string()]);
        assert!(!updated.completed);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(service.pending_reminders().len(), 1);
    }

    #[tokio::test]
    async fn delete_task__should_remove_without_notifying() {
        // Given
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);
        let task = service
            .create_task(new_task("Buy milk", time::Duration::hours(2)))
            .await
            .expect("create task");

        // When
        service.delete_task(&task.id).expect("delete");

        // Then
        assert!(matches!(
            service.get_task(&task.id),
            Err(ServiceError::NotFound { .. })
        ));
        assert!(service.pending_reminders().is_empty());
        assert_eq!(sender.sent().len(), 1);
        assert!(matches!(
            service.delete_task(&task.id),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn subscribe__should_upsert_by_endpoint() {
        // Given
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);
        let request = || SubscriptionRequest {
            endpoint: "https://push.example/abc".to_string(),
            keys: SubscriptionKeys {
                p256dh: "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM".to_string(),
                auth: "tBHItJI5svbpez7KI4CCXg".to_string(),
            },
            user_agent: None,
        };

        // When
        service.subscribe(request()).expect("first subscribe");
        service.subscribe(request()).expect("second subscribe");

        // Then
        assert_eq!(service.store().subscriptions().len(), 2);
        assert_eq!(service.store().subscriptions().find_active().len(), 2);
    }

    #[test]
    fn subscribe__should_store_standard_alphabet_keys_in_web_push_form() {
        // Given
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);
        let mut rng = StdRng::from_seed([3u8; 32]);
        let client_key = generate_vapid_credentials_with_rng(&mut rng).expect("client key");
        let client_key = decode_config(&client_key.public_key, URL_SAFE_NO_PAD).expect("decode key");
        let request = SubscriptionRequest {
            endpoint: "https://push.example/std".to_string(),
            keys: SubscriptionKeys {
                p256dh: encode_config(client_key, STANDARD),
                auth: "xS03Fj5ErfTNH/l9WHE9Ig==".to_string(),
            },
            user_agent: None,
        };

        // When
        let stored = service.subscribe(request).expect("subscribe");

        // Then
        let info = web_push::SubscriptionInfo::new(
            stored.endpoint,
            stored.keys.p256dh,
            stored.keys.auth,
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&info).expect("message builder");
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, b"{}");
        assert!(builder.build().is_ok());
    }

    #[tokio::test]
    async fn create_task__should_not_keep_task_when_store_write_fails() {
        // Given
        let dir = create_temp_dir("service-create-write-failure");
        let store = Arc::new(Store::open(&dir).expect("open store"));
        seed_subscription(&store, "https://push.example/123");
        std::fs::create_dir(dir.join(TASKS_FILE).with_extension("toml.tmp"))
            .expect("block temp file");
        let sender = TestSender::default();
        let service = Service::new(store, TestTime::new(fixed_now()), Some(sender.clone()));

        // When
        let result = service
            .create_task(new_task("Buy milk", time::Duration::hours(2)))
            .await;

        // Then
        assert!(matches!(result, Err(ServiceError::Store(_))));
        assert!(service.list_tasks().is_empty());
        assert!(service.pending_reminders().is_empty());
        assert!(sender.sent().is_empty());

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[tokio::test]
    async fn update_task__should_refresh_reminder_title_on_rename() {
        // Given
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);
        let task = service
            .create_task(new_task("Buy milk", time::Duration::hours(2)))
            .await
            .expect("create task");
        let patch = TaskPatch {
            title: Some("Buy oat milk".to_string()),
            ..TaskPatch::default()
        };

        // When
        service.update_task(&task.id, patch).await.expect("update");

        // Then
        let reminders = service.pending_reminders();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].title, "Buy oat milk");
        assert_eq!(reminders[0].due_at, task.due_date);
    }

    #[test]
    fn unsubscribe__should_reject_missing_endpoint_instead_of_deactivating_all() {
        // Given
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);

        // When
        let missing = service.unsubscribe(None);
        let blank = service.unsubscribe(Some("  "));

        // Then
        assert!(matches!(missing, Err(ServiceError::MissingEndpoint)));
        assert!(matches!(blank, Err(ServiceError::MissingEndpoint)));
        assert_eq!(service.store().subscriptions().find_active().len(), 1);
    }

    #[test]
    fn unsubscribe__should_deactivate_only_the_given_endpoint() {
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);
        seed_subscription(service.store(), "https://push.example/other");

        service
            .unsubscribe(Some("https://push.example/123"))
            .expect("unsubscribe");

        let active = service.store().subscriptions().find_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].endpoint, "https://push.example/other");
    }

    #[tokio::test]
    async fn notify__should_reject_task_event_without_task() {
        let sender = TestSender::default();
        let time = TestTime::new(fixed_now());
        let service = service_with(&sender, &time);

        let result = service
            .notify(NotificationRequest {
                kind: "task_completed".to_string(),
                task: None,
                message: None,
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Compose(_))));
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn notify__should_return_empty_report_when_push_is_disabled() {
        let store = Arc::new(Store::in_memory());
        seed_subscription(&store, "https://push.example/123");
        let service: Service<TestSender, TestTime> =
            Service::new(store, TestTime::new(fixed_now()), None);

        let report = service
            .notify(NotificationRequest {
                kind: "test_message".to_string(),
                task: None,
                message: None,
            })
            .await
            .expect("notify");

        assert_eq!(report, DispatchReport::empty());
    }
}
