//! Domain types for the notification façade.
//!
//! Bitset types (`AuthorizationOptions`, `PresentationOptions`) keep the raw
//! platform bit values so hosts that already speak the native bitmask can pass
//! integers through unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::trigger::NotificationTrigger;

// ============================================================================
// Authorization
// ============================================================================

/// Requested notification capabilities, as a bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationOptions(pub u32);

impl AuthorizationOptions {
    pub const NONE: Self = Self(0);
    pub const BADGE: Self = Self(1 << 0);
    pub const SOUND: Self = Self(1 << 1);
    pub const ALERT: Self = Self(1 << 2);
    pub const CAR_PLAY: Self = Self(1 << 3);
    pub const CRITICAL_ALERT: Self = Self(1 << 4);
    pub const PROVIDES_APP_NOTIFICATION_SETTINGS: Self = Self(1 << 5);
    pub const PROVISIONAL: Self = Self(1 << 6);

    /// Alert, sound and badge together, the common default.
    pub const STANDARD: Self = Self(Self::ALERT.0 | Self::SOUND.0 | Self::BADGE.0);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for AuthorizationOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Authorization state as reported by the notification center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    /// The user has not yet been asked.
    #[default]
    NotDetermined,
    /// The user declined; terminal until changed in system settings.
    Denied,
    /// Full authorization was granted.
    Authorized,
    /// Quiet, trial authorization without an explicit prompt.
    Provisional,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::NotDetermined => "not_determined",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::Authorized => "authorized",
            AuthorizationStatus::Provisional => "provisional",
        }
    }

    /// Whether scheduling is allowed in this state.
    pub fn allows_scheduling(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Authorized | AuthorizationStatus::Provisional
        )
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input to the authorization flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub options: AuthorizationOptions,
    /// Also register for remote push once authorization resolves.
    #[serde(default)]
    pub register_remote: bool,
}

impl AuthorizationRequest {
    pub fn new(options: AuthorizationOptions) -> Self {
        Self {
            options,
            register_remote: false,
        }
    }

    pub fn with_remote(mut self) -> Self {
        self.register_remote = true;
        self
    }
}

/// Outcome of an authorization flow. Exactly one result is produced per
/// request; denial is reported here rather than as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResult {
    pub granted: bool,
    pub status: AuthorizationStatus,
    /// Center-reported error text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Present when remote registration was part of the flow and succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<DeviceToken>,
}

impl AuthorizationResult {
    pub fn granted(status: AuthorizationStatus) -> Self {
        Self {
            granted: true,
            status,
            error: None,
            device_token: None,
        }
    }

    pub fn denied() -> Self {
        Self {
            granted: false,
            status: AuthorizationStatus::Denied,
            error: None,
            device_token: None,
        }
    }

    pub fn with_token(mut self, token: DeviceToken) -> Self {
        self.device_token = Some(token);
        self
    }
}

// ============================================================================
// Settings
// ============================================================================

/// State of a single notification capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingState {
    #[default]
    NotSupported,
    Disabled,
    Enabled,
}

/// How alerts are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStyle {
    #[default]
    None,
    Banner,
    Alert,
}

/// When notification previews are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowPreviews {
    Always,
    WhenAuthenticated,
    #[default]
    Never,
}

/// Snapshot of the center's notification settings.
///
/// Like the cached pending/delivered lists, this is refreshed on demand and
/// is never authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub authorization_status: AuthorizationStatus,
    pub alert_setting: SettingState,
    pub badge_setting: SettingState,
    pub sound_setting: SettingState,
    pub lock_screen_setting: SettingState,
    pub notification_center_setting: SettingState,
    pub alert_style: AlertStyle,
    pub show_previews: ShowPreviews,
}

impl NotificationSettings {
    /// Settings corresponding to a grant of the given options.
    pub fn for_granted(options: AuthorizationOptions, status: AuthorizationStatus) -> Self {
        let setting = |opt: AuthorizationOptions| {
            if options.contains(opt) {
                SettingState::Enabled
            } else {
                SettingState::Disabled
            }
        };
        Self {
            authorization_status: status,
            alert_setting: setting(AuthorizationOptions::ALERT),
            badge_setting: setting(AuthorizationOptions::BADGE),
            sound_setting: setting(AuthorizationOptions::SOUND),
            lock_screen_setting: SettingState::Enabled,
            notification_center_setting: SettingState::Enabled,
            alert_style: if options.contains(AuthorizationOptions::ALERT) {
                AlertStyle::Banner
            } else {
                AlertStyle::None
            },
            show_previews: ShowPreviews::Always,
        }
    }

    /// Settings for a center the user has declined.
    pub fn denied() -> Self {
        Self {
            authorization_status: AuthorizationStatus::Denied,
            ..Default::default()
        }
    }
}

// ============================================================================
// Presentation
// ============================================================================

/// How a notification arriving in the foreground is presented, as a bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresentationOptions(pub u32);

impl PresentationOptions {
    pub const NONE: Self = Self(0);
    pub const BADGE: Self = Self(1 << 0);
    pub const SOUND: Self = Self(1 << 1);
    pub const ALERT: Self = Self(1 << 2);
    pub const LIST: Self = Self(1 << 3);
    pub const BANNER: Self = Self(1 << 4);

    pub const ALL: Self = Self(Self::BADGE.0 | Self::SOUND.0 | Self::LIST.0 | Self::BANNER.0);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for PresentationOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ============================================================================
// Content and requests
// ============================================================================

/// User-visible payload of a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContent {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,

    #[serde(default)]
    pub body: String,

    /// Badge number to apply on delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<i32>,

    /// Sound resource name; None means silent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category_identifier: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thread_identifier: String,

    /// Arbitrary host data carried with the notification.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub user_info: HashMap<String, serde_json::Value>,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_badge(mut self, badge: i32) -> Self {
        self.badge = Some(badge);
        self
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    pub fn with_user_info(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.user_info.insert(key.into(), value);
        self
    }
}

/// A notification queued with the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub trigger: NotificationTrigger,

    /// Per-request override of the manager's foreground presentation options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation: Option<PresentationOptions>,
}

impl NotificationRequest {
    pub fn new(
        identifier: impl Into<String>,
        content: NotificationContent,
        trigger: NotificationTrigger,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            content,
            trigger,
            presentation: None,
        }
    }

    /// Create a request with a generated identifier.
    pub fn with_generated_id(content: NotificationContent, trigger: NotificationTrigger) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), content, trigger)
    }

    pub fn with_presentation(mut self, options: PresentationOptions) -> Self {
        self.presentation = Some(options);
        self
    }

    /// Validate the request before it is handed to a center.
    pub fn validate(&self) -> crate::Result<()> {
        if self.identifier.is_empty() {
            return Err(crate::NotificationError::invalid("empty identifier"));
        }
        self.trigger.validate()
    }
}

/// A notification the center has delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredNotification {
    pub identifier: String,
    pub content: NotificationContent,

    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl DeliveredNotification {
    pub fn new(identifier: impl Into<String>, content: NotificationContent) -> Self {
        Self {
            identifier: identifier.into(),
            content,
            date: OffsetDateTime::now_utc(),
        }
    }
}

// ============================================================================
// Device token
// ============================================================================

/// Opaque token identifying this device for remote push, rendered as hex for
/// hosts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(Vec<u8>);

impl DeviceToken {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for DeviceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceToken({})", self.to_hex())
    }
}
