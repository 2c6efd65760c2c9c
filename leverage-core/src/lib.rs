//! Core types for the Leverage Gateway
//!
//! This crate defines the shared data structures used across the gateway,
//! including trade requests, positions, order books and the real-time
//! update protocol.

pub mod error;
pub mod market;
pub mod position;
pub mod trade;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use market::{OrderBook, OrderBookLevel};
pub use position::{Position, PositionSide, PositionSizing, TrailingStopConfig};
pub use trade::{TradeAction, TradeDraft, TradeRequest};
pub use websocket::{
    ClientMessage, ErrorPayload, TradeUpdate, TrailingStopHit, UpdatePayload, UpdateType,
};
