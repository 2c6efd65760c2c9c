//! Business logic services for the Leverage Gateway
//!
//! This crate provides the service layer between the HTTP/WebSocket
//! surface and the trading backend: trade execution, update broadcasting
//! and risk tooling.

pub mod backend;
pub mod position_manager;
pub mod trade_service;
pub mod trailing_stop_monitor;
pub mod websocket;

pub use backend::{ExecutionBackend, PlaceholderBackend};
pub use position_manager::{PositionManager, SizingParams};
pub use trade_service::TradeService;
pub use trailing_stop_monitor::TrailingStopMonitor;
pub use websocket::{Broadcaster, ClientId, ConnectionRegistry, Frame, RealtimeHandler};
