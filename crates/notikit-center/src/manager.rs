//! Host-facing notification façade.
//!
//! The manager is constructed with an injected [`NotificationCenter`] rather
//! than reached through a process-wide singleton. The center is the source of
//! truth; the manager keeps lock-free snapshots (`ArcSwap`) of the pending,
//! delivered and settings state, refreshed only on demand, so the host's main
//! thread can read them without blocking on async context.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use tracing::{debug, info, warn};

use notikit_core::{
    AuthorizationRequest, AuthorizationResult, AuthorizationStatus, DeliveredNotification,
    DeviceToken, EventBroadcaster, NotificationEvent, NotificationRequest, NotificationSettings,
    NotificationSource, PresentationOptions, Result,
};

use crate::center::NotificationCenter;
use crate::config::ManagerConfig;

/// Cached view of the last authorization outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationSnapshot {
    pub status: AuthorizationStatus,
    pub granted: bool,
}

/// Façade over a [`NotificationCenter`] for embedding in a host application.
pub struct NotificationManager {
    center: Arc<dyn NotificationCenter>,
    events: EventBroadcaster,
    pending: ArcSwap<Vec<NotificationRequest>>,
    delivered: ArcSwap<Vec<DeliveredNotification>>,
    settings: ArcSwap<NotificationSettings>,
    auth: ArcSwap<AuthorizationSnapshot>,
    device_token: ArcSwapOption<DeviceToken>,
    last_received: ArcSwapOption<DeliveredNotification>,
    foreground_presentation: ArcSwap<PresentationOptions>,
}

impl NotificationManager {
    pub fn new(center: Arc<dyn NotificationCenter>, config: ManagerConfig) -> Self {
        Self {
            center,
            events: EventBroadcaster::with_capacity(config.event_capacity),
            pending: ArcSwap::from_pointee(Vec::new()),
            delivered: ArcSwap::from_pointee(Vec::new()),
            settings: ArcSwap::from_pointee(NotificationSettings::default()),
            auth: ArcSwap::from_pointee(AuthorizationSnapshot::default()),
            device_token: ArcSwapOption::empty(),
            last_received: ArcSwapOption::empty(),
            foreground_presentation: ArcSwap::from_pointee(config.foreground_presentation),
        }
    }

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------

    /// Run the authorization flow. Resolves to exactly one result; denial is
    /// carried in the result, not as an error. When `register_remote` is set
    /// and authorization was granted, remote registration runs as part of
    /// the same flow and its token (or failure text) is attached.
    pub async fn request_authorization(
        &self,
        request: AuthorizationRequest,
    ) -> Result<AuthorizationResult> {
        let mut result = self.center.request_authorization(request.options).await?;

        if request.register_remote && result.granted {
            match self.center.register_remote().await {
                Ok(token) => {
                    self.device_token.store(Some(Arc::new(token.clone())));
                    self.events.send_device_token(token.clone());
                    result.device_token = Some(token);
                }
                Err(e) => {
                    warn!(error = %e, "Remote registration failed");
                    result.error = Some(e.to_string());
                }
            }
        }

        self.auth.store(Arc::new(AuthorizationSnapshot {
            status: result.status,
            granted: result.granted,
        }));
        self.events.send_authorization(result.status, result.granted);

        info!(status = %result.status, granted = result.granted, "Authorization completed");
        Ok(result)
    }

    /// Last known authorization status. A snapshot; `refresh_settings`
    /// or a new authorization flow updates it.
    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.auth.load().status
    }

    /// Device token from the most recent successful remote registration.
    pub fn device_token(&self) -> Option<Arc<DeviceToken>> {
        self.device_token.load_full()
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Submit a local notification request to the center. Errors propagate;
    /// a request is never reported scheduled without center acknowledgment.
    pub async fn schedule_local(&self, request: NotificationRequest) -> Result<()> {
        request.validate()?;
        let identifier = request.identifier.clone();
        self.center.add_request(request).await?;
        info!(identifier = %identifier, "Scheduled local notification");
        Ok(())
    }

    /// Remove specific pending requests, then re-sync the pending snapshot.
    pub async fn remove_scheduled(&self, identifiers: &[String]) -> Result<()> {
        self.center.remove_pending(identifiers).await?;
        self.refresh_pending().await
    }

    /// Remove all pending requests, then re-sync the pending snapshot.
    pub async fn remove_all_scheduled(&self) -> Result<()> {
        self.center.remove_all_pending().await?;
        self.refresh_pending().await
    }

    /// Remove specific delivered notifications, then re-sync the delivered
    /// snapshot.
    pub async fn remove_delivered(&self, identifiers: &[String]) -> Result<()> {
        self.center.remove_delivered(identifiers).await?;
        self.refresh_delivered().await
    }

    /// Remove all delivered notifications, then re-sync the delivered
    /// snapshot.
    pub async fn remove_all_delivered(&self) -> Result<()> {
        self.center.remove_all_delivered().await?;
        self.refresh_delivered().await
    }

    /// Set the application badge count; 0 clears it.
    pub async fn set_badge(&self, count: u32) -> Result<()> {
        self.center.set_badge(count).await
    }

    // ------------------------------------------------------------------
    // Snapshot refresh and reads
    // ------------------------------------------------------------------

    /// Re-query the center's pending list. Touches no other cache.
    pub async fn refresh_pending(&self) -> Result<()> {
        let pending = self.center.pending_requests().await?;
        debug!(count = pending.len(), "Refreshed pending snapshot");
        self.pending.store(Arc::new(pending));
        Ok(())
    }

    /// Re-query the center's delivered list. Touches no other cache.
    pub async fn refresh_delivered(&self) -> Result<()> {
        let delivered = self.center.delivered_notifications().await?;
        debug!(count = delivered.len(), "Refreshed delivered snapshot");
        self.delivered.store(Arc::new(delivered));
        Ok(())
    }

    /// Re-query the center's settings, updating the settings and
    /// authorization snapshots.
    pub async fn refresh_settings(&self) -> Result<()> {
        let settings = self.center.notification_settings().await?;
        self.auth.store(Arc::new(AuthorizationSnapshot {
            status: settings.authorization_status,
            granted: settings.authorization_status.allows_scheduling(),
        }));
        self.settings.store(Arc::new(settings));
        Ok(())
    }

    /// Cached pending list; call `refresh_pending` first for fresh data.
    pub fn cached_pending(&self) -> Arc<Vec<NotificationRequest>> {
        self.pending.load_full()
    }

    /// Cached delivered list; call `refresh_delivered` first for fresh data.
    pub fn cached_delivered(&self) -> Arc<Vec<DeliveredNotification>> {
        self.delivered.load_full()
    }

    /// Cached settings snapshot; call `refresh_settings` first for fresh
    /// data.
    pub fn cached_settings(&self) -> Arc<NotificationSettings> {
        self.settings.load_full()
    }

    // ------------------------------------------------------------------
    // Incoming notifications
    // ------------------------------------------------------------------

    /// Entry point for the host's delegate bridge: record and publish a
    /// notification the center just presented to the app.
    pub fn handle_incoming(&self, notification: DeliveredNotification, source: NotificationSource) {
        debug!(
            identifier = %notification.identifier,
            ?source,
            "Notification received"
        );
        self.last_received
            .store(Some(Arc::new(notification.clone())));
        self.events.send_received(notification, source);
    }

    /// The most recently received notification, local or remote.
    pub fn last_received(&self) -> Option<Arc<DeliveredNotification>> {
        self.last_received.load_full()
    }

    /// Presentation to apply to a notification arriving in the foreground:
    /// the request's own override when present, else the manager default.
    pub fn presentation_for(&self, request: &NotificationRequest) -> PresentationOptions {
        request
            .presentation
            .unwrap_or_else(|| **self.foreground_presentation.load())
    }

    /// Default foreground presentation options.
    pub fn foreground_presentation(&self) -> PresentationOptions {
        **self.foreground_presentation.load()
    }

    /// Replace the default foreground presentation options.
    pub fn set_foreground_presentation(&self, options: PresentationOptions) {
        self.foreground_presentation.store(Arc::new(options));
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe to manager events. Only events published after subscription
    /// are received.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for NotificationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationManager")
            .field("authorization_status", &self.authorization_status())
            .field("pending", &self.pending.load().len())
            .field("delivered", &self.delivered.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{AuthorizationPolicy, SimulatedCenter, SimulatedCenterConfig};
    use notikit_core::{
        AuthorizationOptions, NotificationContent, NotificationError, NotificationTrigger,
    };
    use time::OffsetDateTime;

    fn manager_with(config: SimulatedCenterConfig) -> (Arc<SimulatedCenter>, NotificationManager) {
        let center = SimulatedCenter::new_shared(config);
        let manager = NotificationManager::new(center.clone(), ManagerConfig::default());
        (center, manager)
    }

    fn request(id: &str) -> NotificationRequest {
        NotificationRequest::new(
            id,
            NotificationContent::new("title", "body"),
            NotificationTrigger::time_interval(60.0, false),
        )
    }

    #[tokio::test]
    async fn test_authorization_updates_snapshot_and_emits_event() {
        let (_, manager) = manager_with(SimulatedCenterConfig::default());
        let mut events = manager.subscribe();

        assert_eq!(
            manager.authorization_status(),
            AuthorizationStatus::NotDetermined
        );

        let result = manager
            .request_authorization(AuthorizationRequest::new(AuthorizationOptions::STANDARD))
            .await
            .unwrap();
        assert!(result.granted);
        assert_eq!(
            manager.authorization_status(),
            AuthorizationStatus::Authorized
        );

        let event = events.recv().await.unwrap();
        assert!(matches!(
            event,
            NotificationEvent::AuthorizationChanged { granted: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_denied_authorization_is_a_result_not_an_error() {
        let (_, manager) = manager_with(SimulatedCenterConfig {
            policy: AuthorizationPolicy::Deny,
            ..Default::default()
        });

        let result = manager
            .request_authorization(AuthorizationRequest::new(AuthorizationOptions::ALERT))
            .await
            .unwrap();
        assert!(!result.granted);
        assert_eq!(result.status, AuthorizationStatus::Denied);
        assert_eq!(manager.authorization_status(), AuthorizationStatus::Denied);
    }

    #[tokio::test]
    async fn test_remote_registration_attaches_token() {
        let (_, manager) = manager_with(SimulatedCenterConfig::default());
        let mut events = manager.subscribe();

        let result = manager
            .request_authorization(
                AuthorizationRequest::new(AuthorizationOptions::STANDARD).with_remote(),
            )
            .await
            .unwrap();
        assert!(result.granted);
        let token = result.device_token.expect("token attached to result");
        assert_eq!(manager.device_token().unwrap().as_ref(), &token);

        // Token event first, then the authorization event.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, NotificationEvent::DeviceTokenUpdated { .. }));
        let event = events.recv().await.unwrap();
        assert!(matches!(
            event,
            NotificationEvent::AuthorizationChanged { .. }
        ));
    }

    #[tokio::test]
    async fn test_remote_registration_failure_surfaces_in_result() {
        let (_, manager) = manager_with(SimulatedCenterConfig {
            fail_remote_registration: true,
            ..Default::default()
        });

        let result = manager
            .request_authorization(
                AuthorizationRequest::new(AuthorizationOptions::STANDARD).with_remote(),
            )
            .await
            .unwrap();

        // Authorization itself succeeded; only the registration failed.
        assert!(result.granted);
        assert!(result.device_token.is_none());
        assert!(result.error.is_some());
        assert!(manager.device_token().is_none());
    }

    #[tokio::test]
    async fn test_schedule_unauthorized_propagates() {
        let (_, manager) = manager_with(SimulatedCenterConfig::default());
        let err = manager.schedule_local(request("n1")).await.unwrap_err();
        assert!(matches!(err, NotificationError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn test_refresh_pending_touches_only_pending_cache() {
        let (center, manager) = manager_with(SimulatedCenterConfig::default());
        manager
            .request_authorization(AuthorizationRequest::new(AuthorizationOptions::STANDARD))
            .await
            .unwrap();

        manager.schedule_local(request("n1")).await.unwrap();
        center
            .deliver_due(OffsetDateTime::now_utc() + time::Duration::seconds(61))
            .await;

        // Caches start empty and stay empty until refreshed.
        assert!(manager.cached_pending().is_empty());
        assert!(manager.cached_delivered().is_empty());

        manager.schedule_local(request("n2")).await.unwrap();
        manager.refresh_pending().await.unwrap();

        assert_eq!(manager.cached_pending().len(), 1);
        // The delivered cache was not touched by refresh_pending.
        assert!(manager.cached_delivered().is_empty());

        manager.refresh_delivered().await.unwrap();
        assert_eq!(manager.cached_delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_settings_updates_auth_snapshot() {
        let (center, manager) = manager_with(SimulatedCenterConfig::default());

        // Authorize behind the manager's back, directly against the center.
        center
            .request_authorization(AuthorizationOptions::ALERT)
            .await
            .unwrap();
        assert_eq!(
            manager.authorization_status(),
            AuthorizationStatus::NotDetermined
        );

        manager.refresh_settings().await.unwrap();
        assert_eq!(
            manager.authorization_status(),
            AuthorizationStatus::Authorized
        );
        assert_eq!(
            manager.cached_settings().authorization_status,
            AuthorizationStatus::Authorized
        );
    }

    #[tokio::test]
    async fn test_remove_scheduled_resyncs_pending() {
        let (_, manager) = manager_with(SimulatedCenterConfig::default());
        manager
            .request_authorization(AuthorizationRequest::new(AuthorizationOptions::STANDARD))
            .await
            .unwrap();

        manager.schedule_local(request("a")).await.unwrap();
        manager.schedule_local(request("b")).await.unwrap();
        manager.refresh_pending().await.unwrap();
        assert_eq!(manager.cached_pending().len(), 2);

        manager.remove_scheduled(&["a".to_string()]).await.unwrap();
        assert_eq!(manager.cached_pending().len(), 1);
        assert_eq!(manager.cached_pending()[0].identifier, "b");

        manager.remove_all_scheduled().await.unwrap();
        assert!(manager.cached_pending().is_empty());
    }

    #[tokio::test]
    async fn test_handle_incoming_records_and_emits() {
        let (_, manager) = manager_with(SimulatedCenterConfig::default());
        let mut events = manager.subscribe();

        assert!(manager.last_received().is_none());

        let notification =
            DeliveredNotification::new("n1", NotificationContent::new("title", "body"));
        manager.handle_incoming(notification.clone(), NotificationSource::Local);

        assert_eq!(manager.last_received().unwrap().identifier, "n1");
        let event = events.recv().await.unwrap();
        assert!(matches!(event, NotificationEvent::Received { .. }));
    }

    #[tokio::test]
    async fn test_presentation_override() {
        let (_, manager) = manager_with(SimulatedCenterConfig::default());
        assert!(manager.foreground_presentation().is_empty());

        manager.set_foreground_presentation(PresentationOptions::BANNER);

        let plain = request("n1");
        assert_eq!(manager.presentation_for(&plain), PresentationOptions::BANNER);

        let overridden = request("n2")
            .with_presentation(PresentationOptions::SOUND | PresentationOptions::LIST);
        assert_eq!(
            manager.presentation_for(&overridden),
            PresentationOptions::SOUND | PresentationOptions::LIST
        );
    }
}
