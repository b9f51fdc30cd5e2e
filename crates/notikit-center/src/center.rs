use async_trait::async_trait;

use notikit_core::{
    AuthorizationOptions, AuthorizationResult, DeliveredNotification, DeviceToken,
    NotificationRequest, NotificationSettings, Result,
};

/// Boundary to the platform notification engine.
///
/// Implementations wrap whatever actually owns notification state (the OS
/// center, or [`crate::SimulatedCenter`] in-process). The façade never holds
/// authoritative state of its own; everything here is queried on demand.
#[async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Ask for permission to show notifications with the given capabilities.
    ///
    /// Produces exactly one result per call. Denial is reported through
    /// `AuthorizationResult::granted`, not as an error.
    async fn request_authorization(
        &self,
        options: AuthorizationOptions,
    ) -> Result<AuthorizationResult>;

    /// Register for remote push, yielding the device token.
    async fn register_remote(&self) -> Result<DeviceToken>;

    /// Queue a local notification request.
    ///
    /// Fails with `NotAuthorized` unless the current status allows
    /// scheduling. Adding a request whose identifier is already pending
    /// replaces the existing request.
    async fn add_request(&self, request: NotificationRequest) -> Result<()>;

    /// Requests queued but not yet delivered.
    async fn pending_requests(&self) -> Result<Vec<NotificationRequest>>;

    /// Notifications already delivered and still present in the center.
    async fn delivered_notifications(&self) -> Result<Vec<DeliveredNotification>>;

    /// Remove specific pending requests; unknown identifiers are ignored.
    async fn remove_pending(&self, identifiers: &[String]) -> Result<()>;

    /// Remove all pending requests.
    async fn remove_all_pending(&self) -> Result<()>;

    /// Remove specific delivered notifications; unknown identifiers are
    /// ignored.
    async fn remove_delivered(&self, identifiers: &[String]) -> Result<()>;

    /// Remove all delivered notifications.
    async fn remove_all_delivered(&self) -> Result<()>;

    /// Current settings snapshot.
    async fn notification_settings(&self) -> Result<NotificationSettings>;

    /// Set the application badge count; 0 clears it.
    async fn set_badge(&self, count: u32) -> Result<()>;
}
