pub mod clock;
pub mod push;

pub use clock::TimeProvider;
pub use push::{DeliveryError, PushSender};
