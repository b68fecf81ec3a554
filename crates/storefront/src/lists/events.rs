//! Authentication transitions reported by the identity collaborator.

use tokio::sync::broadcast;

use cartsync_core::OwnerId;

const CHANNEL_CAPACITY: usize = 16;

/// A change in who the visitor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(OwnerId),
    SignedOut,
}

/// Broadcasts [`AuthEvent`]s to every attached list controller.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Returns how many subscribers will see it.
    pub fn publish(&self, event: AuthEvent) -> usize {
        tracing::debug!(?event, "Publishing auth event");
        // No subscribers is not an error: nothing is listening yet.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn signed_in(&self, owner_id: OwnerId) -> usize {
        self.publish(AuthEvent::SignedIn(owner_id))
    }

    pub fn signed_out(&self) -> usize {
        self.publish(AuthEvent::SignedOut)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let events = AuthEvents::new();
        let mut rx = events.subscribe();
        let owner = OwnerId::new(Uuid::new_v4());

        assert_eq!(events.signed_in(owner), 1);
        assert_eq!(events.signed_out(), 1);

        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedIn(owner));
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut);
    }

    #[test]
    fn test_publish_without_subscribers() {
        assert_eq!(AuthEvents::new().signed_out(), 0);
    }
}
