use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use web_push::WebPushError;

use crate::ports;
use crate::types::push::{Subscription, VapidConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

/// Delivers JSON payloads through the Web Push protocol, signed with the
/// configured VAPID key.
#[derive(Clone)]
pub struct WebPushSender {
    vapid: Arc<VapidConfig>,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid: Arc::new(vapid),
            client: Arc::new(client),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.vapid.public_key
    }
}

impl ports::PushSender for WebPushSender {
    type Error = WebPushError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            let subscription_info = web_push::SubscriptionInfo::new(
                subscription.endpoint.clone(),
                subscription.keys.p256dh.clone(),
                subscription.keys.auth.clone(),
            );
            let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
            builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload.as_bytes());
            let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
                &self.vapid.private_key,
                web_push::URL_SAFE_NO_PAD,
                &subscription_info,
            )?;
            signature_builder.add_claim("sub", self.vapid.subject.as_str());
            builder.set_vapid_signature(signature_builder.build()?);
            self.client.send(builder.build()?).await?;
            Ok(())
        })
    }
}

impl ports::DeliveryError for WebPushError {
    fn status_code(&self) -> Option<u16> {
        match self {
            WebPushError::EndpointNotValid { .. } => Some(410),
            WebPushError::EndpointNotFound { .. } => Some(404),
            WebPushError::Unauthorized { .. } => Some(401),
            WebPushError::BadRequest { .. } => Some(400),
            WebPushError::PayloadTooLarge { .. } => Some(413),
            WebPushError::ServerError { .. } => Some(500),
            _ => None,
        }
    }
}
