//! Core types for the NotiKit local-notification façade.
//!
//! This crate defines the domain model shared between a host application and
//! a notification center backend:
//! - authorization options, status and settings snapshots
//! - notification content, triggers and requests
//! - delivered-notification records and device tokens
//! - the event types broadcast to hosts

pub mod error;
pub mod events;
pub mod trigger;
pub mod types;

pub use error::{NotificationError, Result};
pub use events::{EventBroadcaster, NotificationEvent, NotificationSource};
pub use trigger::{DateComponents, NotificationTrigger};
pub use types::*;
