use thiserror::Error;

use crate::types::AuthorizationStatus;

pub type Result<T> = std::result::Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Not authorized to schedule notifications (status: {0})")]
    NotAuthorized(AuthorizationStatus),

    #[error("Invalid notification request: {0}")]
    InvalidRequest(String),

    #[error("Notification not found: {0}")]
    NotFound(String),

    #[error("Remote registration failed: {0}")]
    RemoteRegistrationFailed(String),

    #[error("Notification center unavailable: {0}")]
    CenterUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NotificationError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
