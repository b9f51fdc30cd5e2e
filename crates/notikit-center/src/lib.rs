//! Notification center boundary and host façade.
//!
//! The [`NotificationCenter`] trait is the seam between the façade and the
//! platform's notification engine: the platform owns scheduling, delivery and
//! authorization; this crate only drives it and caches snapshots of its
//! state. [`SimulatedCenter`] is an in-process implementation of that seam
//! for hosts without an OS bridge and for tests. [`NotificationManager`] is
//! the surface a host embeds: request/response authorization, scheduling,
//! on-demand snapshot refresh and a broadcast event channel.

pub mod center;
pub mod config;
pub mod manager;
pub mod simulated;

pub use center::NotificationCenter;
pub use config::ManagerConfig;
pub use manager::{AuthorizationSnapshot, NotificationManager};
pub use simulated::{AuthorizationPolicy, SimulatedCenter, SimulatedCenterConfig};
