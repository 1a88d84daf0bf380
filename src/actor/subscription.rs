use std::fmt;
use std::sync::Weak;

/// Something a subscription can be removed from.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

/// Handle returned by [`Actor::subscribe`](crate::actor::Actor::subscribe).
///
/// Dropping the handle keeps the listener attached; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
pub struct Subscription {
    source: Option<Weak<dyn Detach>>,
    id: u64,
}

impl Subscription {
    pub(crate) fn attached(source: Weak<dyn Detach>, id: u64) -> Self {
        Self {
            source: Some(source),
            id,
        }
    }

    /// Subscription to an actor that had already halted.
    pub(crate) fn detached() -> Self {
        Self { source: None, id: 0 }
    }

    /// Stop receiving snapshots. No-op if the actor already detached the
    /// listener or has been dropped.
    pub fn unsubscribe(self) {
        if let Some(source) = self.source.as_ref().and_then(Weak::upgrade) {
            source.detach(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.source.is_some())
            .finish()
    }
}
