//! In-process notification center.
//!
//! `SimulatedCenter` implements the [`NotificationCenter`] seam without an OS
//! bridge: it owns the authorization state machine, the pending and delivered
//! lists, and a tick-driven delivery loop that fires due triggers. Hosts use
//! it in environments without a platform center (editors, CI); tests use it
//! to script authorization outcomes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::{RwLock, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};

use notikit_core::{
    AuthorizationOptions, AuthorizationResult, AuthorizationStatus, DeliveredNotification,
    DeviceToken, NotificationContent, NotificationError, NotificationRequest,
    NotificationSettings, NotificationSource, NotificationTrigger, Result,
};

use crate::center::NotificationCenter;

/// Scripted outcome of an authorization prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationPolicy {
    /// The user accepts the prompt.
    #[default]
    Grant,
    /// The user declines the prompt.
    Deny,
}

/// Configuration for [`SimulatedCenter`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedCenterConfig {
    pub policy: AuthorizationPolicy,

    /// Make `register_remote` fail, for exercising the error path.
    pub fail_remote_registration: bool,
}

struct PendingEntry {
    request: NotificationRequest,
    next_fire: OffsetDateTime,
}

#[derive(Default)]
struct CenterState {
    status: AuthorizationStatus,
    granted_options: AuthorizationOptions,
    pending: Vec<PendingEntry>,
    delivered: Vec<DeliveredNotification>,
    badge: u32,
    device_token: Option<DeviceToken>,
}

/// In-process [`NotificationCenter`] implementation.
pub struct SimulatedCenter {
    config: SimulatedCenterConfig,
    state: RwLock<CenterState>,
    delivery_tx: mpsc::UnboundedSender<(DeliveredNotification, NotificationSource)>,
    delivery_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<(DeliveredNotification, NotificationSource)>>>,
}

impl SimulatedCenter {
    pub fn new(config: SimulatedCenterConfig) -> Self {
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        Self {
            config,
            state: RwLock::new(CenterState::default()),
            delivery_tx,
            delivery_rx: std::sync::Mutex::new(Some(delivery_rx)),
        }
    }

    pub fn new_shared(config: SimulatedCenterConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Take the delivery stream. The host forwards items to
    /// [`crate::NotificationManager::handle_incoming`], standing in for the
    /// platform's delegate callbacks. Can only be taken once.
    pub fn take_deliveries(
        &self,
    ) -> Option<mpsc::UnboundedReceiver<(DeliveredNotification, NotificationSource)>> {
        self.delivery_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Delivery loop: fire due triggers every `poll_interval`.
    pub async fn run(&self, poll_interval: std::time::Duration) {
        let mut ticker = interval(poll_interval);

        info!("Notification delivery loop started");

        loop {
            ticker.tick().await;

            let fired = self.deliver_due(OffsetDateTime::now_utc()).await;
            if fired > 0 {
                debug!(count = fired, "Delivered due notifications");
            }
        }
    }

    /// Fire every pending request due at `now`. Repeating triggers are
    /// re-armed from `now`, coalescing any missed occurrences; one-shot
    /// requests leave the pending list. Returns the number of notifications
    /// delivered.
    pub async fn deliver_due(&self, now: OffsetDateTime) -> usize {
        let mut state = self.state.write().await;
        let mut delivered = 0;
        let mut index = 0;

        while index < state.pending.len() {
            if state.pending[index].next_fire > now {
                index += 1;
                continue;
            }

            let repeats = state.pending[index].request.trigger.repeats();
            let (notification, rearmed) = {
                let entry = &mut state.pending[index];
                let notification = DeliveredNotification {
                    identifier: entry.request.identifier.clone(),
                    content: entry.request.content.clone(),
                    date: entry.next_fire,
                };
                // A repeating trigger with no further occurrence (e.g. a
                // fully specified calendar date) is spent and must leave the
                // pending list, or it would re-fire on every tick.
                let rearmed = if repeats {
                    match entry.request.trigger.next_fire_after(now) {
                        Some(next) => {
                            entry.next_fire = next;
                            true
                        }
                        None => false,
                    }
                } else {
                    false
                };
                (notification, rearmed)
            };
            if !rearmed {
                state.pending.remove(index);
            } else {
                index += 1;
            }

            if let Some(badge) = notification.content.badge
                && badge >= 0
            {
                state.badge = badge as u32;
            }

            debug!(
                identifier = %notification.identifier,
                fired_at = %notification.date,
                repeats,
                "Notification fired"
            );

            state.delivered.push(notification.clone());
            if self
                .delivery_tx
                .send((notification, NotificationSource::Local))
                .is_err()
            {
                debug!("Delivery stream closed; host is not listening");
            }
            delivered += 1;
        }

        delivered
    }

    /// Inject a remote notification, as if the OS routed a push to the app.
    pub async fn simulate_remote_push(&self, content: NotificationContent) -> DeliveredNotification {
        let notification = DeliveredNotification::new(uuid::Uuid::new_v4().to_string(), content);

        let mut state = self.state.write().await;
        state.delivered.push(notification.clone());
        drop(state);

        if self
            .delivery_tx
            .send((notification.clone(), NotificationSource::Remote))
            .is_err()
        {
            debug!("Delivery stream closed; host is not listening");
        }
        notification
    }

    /// Return to the not-determined state and drop all center state. Stands
    /// in for the user changing notification settings at the OS level; a
    /// denial cannot be left any other way.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = CenterState::default();
        info!("Notification center reset");
    }

    /// Current badge count.
    pub async fn badge(&self) -> u32 {
        self.state.read().await.badge
    }

    fn settings_from(state: &CenterState) -> NotificationSettings {
        match state.status {
            AuthorizationStatus::NotDetermined => NotificationSettings::default(),
            AuthorizationStatus::Denied => NotificationSettings::denied(),
            status => NotificationSettings::for_granted(state.granted_options, status),
        }
    }
}

#[async_trait]
impl NotificationCenter for SimulatedCenter {
    async fn request_authorization(
        &self,
        options: AuthorizationOptions,
    ) -> Result<AuthorizationResult> {
        let mut state = self.state.write().await;

        let result = match state.status {
            // A denial is terminal until the center is reset.
            AuthorizationStatus::Denied => AuthorizationResult::denied(),

            // Re-requesting after a grant widens the granted options without
            // prompting again.
            AuthorizationStatus::Authorized | AuthorizationStatus::Provisional => {
                state.granted_options = state.granted_options.union(options);
                AuthorizationResult::granted(state.status)
            }

            AuthorizationStatus::NotDetermined => {
                // Provisional requests are granted quietly, without a prompt,
                // so the scripted policy does not apply.
                if options.contains(AuthorizationOptions::PROVISIONAL) {
                    state.status = AuthorizationStatus::Provisional;
                    state.granted_options = options;
                    AuthorizationResult::granted(AuthorizationStatus::Provisional)
                } else {
                    match self.config.policy {
                        AuthorizationPolicy::Grant => {
                            state.status = AuthorizationStatus::Authorized;
                            state.granted_options = options;
                            AuthorizationResult::granted(AuthorizationStatus::Authorized)
                        }
                        AuthorizationPolicy::Deny => {
                            state.status = AuthorizationStatus::Denied;
                            state.granted_options = AuthorizationOptions::NONE;
                            AuthorizationResult::denied()
                        }
                    }
                }
            }
        };

        info!(
            status = %result.status,
            granted = result.granted,
            options = options.bits(),
            "Authorization resolved"
        );
        Ok(result)
    }

    async fn register_remote(&self) -> Result<DeviceToken> {
        if self.config.fail_remote_registration {
            warn!("Remote registration failed (scripted)");
            return Err(NotificationError::RemoteRegistrationFailed(
                "registration rejected".into(),
            ));
        }

        let mut state = self.state.write().await;
        if let Some(token) = &state.device_token {
            return Ok(token.clone());
        }

        let mut bytes = uuid::Uuid::new_v4().as_bytes().to_vec();
        bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        let token = DeviceToken::new(bytes);
        state.device_token = Some(token.clone());

        info!(token = %token, "Registered for remote notifications");
        Ok(token)
    }

    async fn add_request(&self, request: NotificationRequest) -> Result<()> {
        request.validate()?;
        if matches!(request.trigger, NotificationTrigger::Push) {
            return Err(NotificationError::invalid(
                "push triggers cannot be scheduled locally",
            ));
        }

        let mut state = self.state.write().await;
        if !state.status.allows_scheduling() {
            return Err(NotificationError::NotAuthorized(state.status));
        }

        let now = OffsetDateTime::now_utc();
        let next_fire = request
            .trigger
            .next_fire_after(now)
            .ok_or_else(|| NotificationError::invalid("trigger never fires"))?;

        // Same identifier replaces the existing pending request.
        if let Some(existing) = state
            .pending
            .iter_mut()
            .find(|entry| entry.request.identifier == request.identifier)
        {
            debug!(identifier = %request.identifier, "Replacing pending request");
            existing.request = request;
            existing.next_fire = next_fire;
        } else {
            debug!(
                identifier = %request.identifier,
                fires_at = %next_fire,
                "Queued notification request"
            );
            state.pending.push(PendingEntry { request, next_fire });
        }
        Ok(())
    }

    async fn pending_requests(&self) -> Result<Vec<NotificationRequest>> {
        let state = self.state.read().await;
        Ok(state
            .pending
            .iter()
            .map(|entry| entry.request.clone())
            .collect())
    }

    async fn delivered_notifications(&self) -> Result<Vec<DeliveredNotification>> {
        let state = self.state.read().await;
        Ok(state.delivered.clone())
    }

    async fn remove_pending(&self, identifiers: &[String]) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .pending
            .retain(|entry| !identifiers.contains(&entry.request.identifier));
        Ok(())
    }

    async fn remove_all_pending(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.pending.clear();
        Ok(())
    }

    async fn remove_delivered(&self, identifiers: &[String]) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .delivered
            .retain(|notification| !identifiers.contains(&notification.identifier));
        Ok(())
    }

    async fn remove_all_delivered(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.delivered.clear();
        Ok(())
    }

    async fn notification_settings(&self) -> Result<NotificationSettings> {
        let state = self.state.read().await;
        Ok(Self::settings_from(&state))
    }

    async fn set_badge(&self, count: u32) -> Result<()> {
        let mut state = self.state.write().await;
        state.badge = count;
        Ok(())
    }
}
