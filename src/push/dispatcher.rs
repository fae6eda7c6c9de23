use std::sync::Arc;

use tokio::task::JoinSet;

use crate::ports::{self, DeliveryError};
use crate::store::Store;
use crate::types::push::{DeliveryOutcome, DispatchReport, NotificationPayload};

/// One endpoint that did not accept a notification. Always absorbed by the
/// dispatcher and turned into a store update.
#[derive(Debug, thiserror::Error)]
#[error("delivery to {endpoint} failed (status {status:?}): {reason}")]
pub struct DeliveryFailure {
    pub endpoint: String,
    pub status: Option<u16>,
    pub reason: String,
    pub outcome: DeliveryOutcome,
}

impl DeliveryFailure {
    fn from_error<E: DeliveryError>(endpoint: String, err: &E) -> Self {
        let outcome = if err.is_terminal() {
            DeliveryOutcome::Gone
        } else {
            DeliveryOutcome::Transient
        };
        Self {
            endpoint,
            status: err.status_code(),
            reason: err.to_string(),
            outcome,
        }
    }
}

/// Fans a payload out to every active subscription.
pub struct Dispatcher<S, T> {
    store: Arc<Store>,
    sender: S,
    time: T,
}

impl<S, T> Dispatcher<S, T>
where
    S: ports::PushSender,
    T: ports::TimeProvider,
{
    pub fn new(store: Arc<Store>, sender: S, time: T) -> Self {
        Self {
            store,
            sender,
            time,
        }
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    /// Delivers to all active subscriptions concurrently and waits for every
    /// attempt to settle. A failing endpoint never affects the others.
    pub async fn dispatch(&self, payload: &NotificationPayload) -> DispatchReport {
        let subscriptions = self.store.subscriptions().find_active();
        if subscriptions.is_empty() {
            tracing::info!(tag = %payload.tag, "no active subscriptions, nothing delivered");
            return DispatchReport::empty();
        }
        let total = subscriptions.len();

        let message: Arc<str> = match serde_json::to_string(payload) {
            Ok(message) => message.into(),
            Err(err) => {
                tracing::error!(error = %err, tag = %payload.tag, "failed to serialize payload");
                return DispatchReport {
                    success: false,
                    sent: 0,
                    total,
                };
            }
        };

        let mut attempts = JoinSet::new();
        for subscription in subscriptions {
            let sender = self.sender.clone();
            let message = Arc::clone(&message);
            attempts.spawn(async move {
                let result = sender.send(&subscription, &message).await;
                match result {
                    Ok(()) => Ok(subscription.endpoint),
                    Err(err) => Err(DeliveryFailure::from_error(subscription.endpoint, &err)),
                }
            });
        }

        let mut sent = 0;
        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok(Ok(endpoint)) => {
                    sent += 1;
                    self.settle(&endpoint, DeliveryOutcome::Delivered);
                }
                Ok(Err(failure)) => {
                    if failure.outcome == DeliveryOutcome::Gone {
                        tracing::info!(
                            endpoint = %failure.endpoint,
                            status = ?failure.status,
                            "deactivating subscription rejected by push service"
                        );
                    } else {
                        tracing::warn!(error = %failure, "push delivery failed");
                    }
                    self.settle(&failure.endpoint, failure.outcome);
                }
                Err(err) => {
                    tracing::error!(error = %err, "push delivery task aborted");
                }
            }
        }

        tracing::info!(tag = %payload.tag, sent, total, "push dispatch settled");
        DispatchReport {
            success: sent > 0,
            sent,
            total,
        }
    }

    fn settle(&self, endpoint: &str, outcome: DeliveryOutcome) {
        let now = self.time.now();
        if let Err(err) = self
            .store
            .subscriptions()
            .record_delivery(endpoint, now, outcome)
        {
            tracing::error!(error = %err, endpoint, "failed to record delivery outcome");
        }
    }
}
