//! WebSocket infrastructure for real-time trade updates
//!
//! This module provides the connection registry, the update broadcaster
//! and the per-connection handler.

mod broadcast;
mod handler;
mod registry;

pub use broadcast::Broadcaster;
pub use handler::{Frame, RealtimeHandler};
pub use registry::{ClientId, ConnectionRegistry, OUTBOUND_QUEUE_CAPACITY};
