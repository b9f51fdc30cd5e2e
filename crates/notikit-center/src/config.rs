use serde::{Deserialize, Serialize};

use notikit_core::PresentationOptions;

/// Host-supplied configuration for [`crate::NotificationManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagerConfig {
    /// Presentation applied to notifications arriving while the app is in
    /// the foreground, unless the request carries its own override. The
    /// platform default is to present nothing.
    pub foreground_presentation: PresentationOptions,

    /// Buffer size of the host event channel.
    pub event_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            foreground_presentation: PresentationOptions::NONE,
            event_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ManagerConfig::default();
        assert!(config.foreground_presentation.is_empty());
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: ManagerConfig =
            serde_json::from_str(r#"{"foregroundPresentation": 18}"#).unwrap();
        assert!(
            config
                .foreground_presentation
                .contains(PresentationOptions::SOUND)
        );
        assert!(
            config
                .foreground_presentation
                .contains(PresentationOptions::BANNER)
        );
        assert_eq!(config.event_capacity, 256);
    }
}
