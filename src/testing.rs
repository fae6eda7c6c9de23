//! Fakes for the port traits, shared by unit tests across modules.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::oneshot;

use crate::ports;
use crate::store::Store;
use crate::types::push::{Subscription, SubscriptionKeys};

pub(crate) fn fixed_now() -> OffsetDateTime {
    OffsetDateTime::parse("2025-01-12T09:30:00Z", &Rfc3339).expect("parse now")
}

pub(crate) fn seed_subscription(store: &Store, endpoint: &str) -> Subscription {
    store
        .subscriptions()
        .upsert_by_endpoint(
            endpoint,
            SubscriptionKeys {
                p256dh: "p256".to_string(),
                auth: "auth".to_string(),
            },
            None,
            fixed_now(),
        )
        .expect("seed subscription")
}

#[derive(Clone)]
pub(crate) struct TestTime {
    now: Arc<Mutex<OffsetDateTime>>,
    sleeps: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
    durations: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
            durations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
        self.durations.lock().expect("durations lock").clone()
    }

    /// Moves the clock and wakes every pending sleep.
    pub(crate) fn advance_and_wake(&self, by: time::Duration) {
        {
            let mut now = self.now.lock().expect("now lock");
            *now += by;
        }
        let mut sends = self.sleeps.lock().expect("sleeps lock");
        for sender in sends.drain(..) {
            let _ = sender.send(());
        }
    }
}

pub(crate) struct ManualSleep {
    receiver: oneshot::Receiver<()>,
}

impl Future for ManualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl ports::TimeProvider for TestTime {
    type Sleep<'a>
        = ManualSleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        *self.now.lock().expect("now lock")
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        let (sender, receiver) = oneshot::channel();
        self.durations
            .lock()
            .expect("durations lock")
            .push(duration);
        self.sleeps.lock().expect("sleeps lock").push(sender);
        ManualSleep { receiver }
    }
}

#[derive(Debug)]
pub(crate) struct TestSendError {
    status: Option<u16>,
}

impl std::fmt::Display for TestSendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "push service answered {status}"),
            None => f.write_str("connection reset"),
        }
    }
}

impl ports::DeliveryError for TestSendError {
    fn status_code(&self) -> Option<u16> {
        self.status
    }
}

/// Records every send; endpoints registered with `failing` answer with the
/// given status instead.
#[derive(Clone, Default)]
pub(crate) struct TestSender {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failures: Arc<HashMap<String, Option<u16>>>,
}

impl TestSender {
    pub(crate) fn failing(mut self, endpoint: &str, status: Option<u16>) -> Self {
        Arc::make_mut(&mut self.failures).insert(endpoint.to_string(), status);
        self
    }

    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent lock").clone()
    }
}

impl ports::PushSender for TestSender {
    type Error = TestSendError;
    type Fut<'a>
        = std::future::Ready<Result<(), Self::Error>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a> {
        self.sent
            .lock()
            .expect("sent lock")
            .push((subscription.endpoint.clone(), payload.to_string()));
        match self.failures.get(&subscription.endpoint) {
            Some(status) => std::future::ready(Err(TestSendError { status: *status })),
            None => std::future::ready(Ok(())),
        }
    }
}
