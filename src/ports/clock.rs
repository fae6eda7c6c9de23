use std::time::Duration;

use time::OffsetDateTime;

/// Wall clock plus a one-shot timer.
///
/// Sleeps are process-local; nothing scheduled through this trait survives a
/// restart.
pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}
