use crate::types::push::Subscription;

/// Failure reported by a push delivery channel.
pub trait DeliveryError: std::fmt::Display + Send + Sync + 'static {
    /// HTTP status returned by the push service, when the request got that far.
    fn status_code(&self) -> Option<u16>;

    /// Whether the endpoint can never accept a message again.
    fn is_terminal(&self) -> bool {
        matches!(self.status_code(), Some(404) | Some(410))
    }
}

pub trait PushSender: Clone + Send + Sync + 'static {
    type Error: DeliveryError;
    type Fut<'a>: Future<Output = Result<(), Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a>;
}
