use crate::adapters::WebPushSender;
use crate::config;

pub mod composer;
pub mod dispatcher;
pub mod reminder;
pub mod vapid;

pub use composer::{ComposeError, compose};
pub use dispatcher::{DeliveryFailure, Dispatcher};
pub use reminder::{PendingReminder, Reminders};
pub use vapid::{VapidConfigStatus, VapidCredentials, generate_vapid_credentials, load_vapid_config};

/// Builds the Web Push delivery channel from the configured VAPID keys.
/// Returns `None`, and push stays disabled, when the keys are absent or
/// unusable.
pub fn build_sender(config: &config::AppConfig) -> Option<WebPushSender> {
    let vapid = match load_vapid_config(config) {
        VapidConfigStatus::Ready(vapid) => vapid,
        VapidConfigStatus::Incomplete => {
            tracing::warn!("push notifications disabled: incomplete VAPID configuration");
            return None;
        }
        VapidConfigStatus::Invalid(reason) => {
            tracing::warn!(reason, "push notifications disabled: invalid VAPID configuration");
            return None;
        }
        VapidConfigStatus::Missing => {
            tracing::info!("push notifications disabled: no VAPID configuration");
            return None;
        }
    };

    match WebPushSender::new(vapid) {
        Ok(sender) => Some(sender),
        Err(err) => {
            tracing::warn!(error = %err, "push notifications disabled: failed to init web-push");
            None
        }
    }
}
