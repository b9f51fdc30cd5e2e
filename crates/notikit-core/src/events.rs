//! Event channel between the notification façade and its host.
//!
//! The `EventBroadcaster` replaces per-callback function pointers with a
//! tokio broadcast channel: multiple host subscribers, events published from
//! async context, subscribers only see events sent after they subscribe.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{AuthorizationStatus, DeliveredNotification, DeviceToken};

/// Default buffer size for the broadcast channel. Slow receivers lag and
/// drop the oldest events beyond this limit.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// Where a received notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSource {
    Local,
    Remote,
}

/// Events published to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum NotificationEvent {
    /// A local notification fired.
    Received { notification: DeliveredNotification },

    /// A remote notification was routed through the OS to the app.
    RemoteReceived { notification: DeliveredNotification },

    /// The authorization status changed (one per authorization flow).
    AuthorizationChanged {
        status: AuthorizationStatus,
        granted: bool,
    },

    /// Remote registration produced a device token.
    DeviceTokenUpdated { token: DeviceToken },
}

/// Broadcaster for notification events.
///
/// Thread-safe and clonable; clones share the same channel.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster with default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new broadcaster with custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new broadcaster wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, 0 when
    /// nobody is listening.
    pub fn send(&self, event: NotificationEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Send a received-notification event for the given source.
    pub fn send_received(
        &self,
        notification: DeliveredNotification,
        source: NotificationSource,
    ) -> usize {
        let event = match source {
            NotificationSource::Local => NotificationEvent::Received { notification },
            NotificationSource::Remote => NotificationEvent::RemoteReceived { notification },
        };
        self.send(event)
    }

    /// Send an authorization-changed event.
    pub fn send_authorization(&self, status: AuthorizationStatus, granted: bool) -> usize {
        self.send(NotificationEvent::AuthorizationChanged { status, granted })
    }

    /// Send a device-token event.
    pub fn send_device_token(&self, token: DeviceToken) -> usize {
        self.send(NotificationEvent::DeviceTokenUpdated { token })
    }

    /// Subscribe to events. Events sent before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers.
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
