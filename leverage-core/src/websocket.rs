//! WebSocket message types for real-time trade updates
//!
//! These types define the protocol between the gateway and its real-time
//! clients. Every outbound frame is a [`TradeUpdate`] encoded as
//! `{"type": ..., "data": ..., "timestamp": ...}`.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};
use crate::position::{Position, TrailingStopConfig};
use crate::trade::{TradeDraft, TradeRequest};

// ============================================================================
// Client -> Server Messages
// ============================================================================

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Execute a trade and broadcast the result
    Trade(TradeDraft),
    /// Well-formed message with a type the gateway does not handle
    Unsupported(String),
}

#[derive(Deserialize)]
struct RawClientMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl ClientMessage {
    pub const TRADE: &'static str = "TRADE";

    /// Parse an inbound text frame
    ///
    /// Fails when the text is not JSON, is not an object with a string
    /// `type`, or carries a `TRADE` payload that is not shaped like an order.
    pub fn parse(text: &str) -> GatewayResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| GatewayError::protocol(format!("Invalid message: {}", e)))?;
        if !value.is_object() {
            return Err(GatewayError::protocol("Invalid message: expected a JSON object"));
        }

        let raw: RawClientMessage = serde_json::from_value(value)
            .map_err(|e| GatewayError::protocol(format!("Invalid message: {}", e)))?;

        if raw.kind != Self::TRADE {
            return Ok(ClientMessage::Unsupported(raw.kind));
        }

        let draft = match raw.data {
            Value::Null => TradeDraft::default(),
            data => serde_json::from_value(data)
                .map_err(|e| GatewayError::protocol(format!("Invalid trade payload: {}", e)))?,
        };

        Ok(ClientMessage::Trade(draft))
    }
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

/// Discriminant of a [`TradeUpdate`], the `type` field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateType {
    Execution,
    PositionUpdate,
    Liquidation,
    Error,
    TrailingStopHit,
}

/// Typed payload of a [`TradeUpdate`], keyed by [`UpdateType`]
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePayload {
    /// A trade was accepted by the backend
    Execution(TradeRequest),
    /// A position changed
    PositionUpdate(Position),
    /// A position was liquidated
    Liquidation(Position),
    /// Something went wrong
    Error(ErrorPayload),
    /// A trailing stop was crossed and the position closed
    TrailingStopHit(TrailingStopHit),
}

/// Payload of an `ERROR` update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Payload of a `TRAILING_STOP_HIT` update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopHit {
    pub symbol: String,
    /// Price that crossed the stop
    pub price: Decimal,
    pub stop: TrailingStopConfig,
}

/// Envelope broadcast to every real-time connection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTradeUpdate")]
pub struct TradeUpdate {
    pub payload: UpdatePayload,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl TradeUpdate {
    /// Create an update stamped with the current time
    pub fn new(payload: UpdatePayload) -> Self {
        Self {
            payload,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn execution(request: TradeRequest) -> Self {
        Self::new(UpdatePayload::Execution(request))
    }

    pub fn position_update(position: Position) -> Self {
        Self::new(UpdatePayload::PositionUpdate(position))
    }

    pub fn liquidation(position: Position) -> Self {
        Self::new(UpdatePayload::Liquidation(position))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(UpdatePayload::Error(ErrorPayload {
            message: message.into(),
        }))
    }

    pub fn trailing_stop_hit(symbol: impl Into<String>, price: Decimal, stop: TrailingStopConfig) -> Self {
        Self::new(UpdatePayload::TrailingStopHit(TrailingStopHit {
            symbol: symbol.into(),
            price,
            stop,
        }))
    }

    pub fn kind(&self) -> UpdateType {
        match self.payload {
            UpdatePayload::Execution(_) => UpdateType::Execution,
            UpdatePayload::PositionUpdate(_) => UpdateType::PositionUpdate,
            UpdatePayload::Liquidation(_) => UpdateType::Liquidation,
            UpdatePayload::Error(_) => UpdateType::Error,
            UpdatePayload::TrailingStopHit(_) => UpdateType::TrailingStopHit,
        }
    }

    /// Encode to the JSON text sent over the wire
    pub fn to_json(&self) -> GatewayResult<String> {
        serde_json::to_string(self).map_err(|e| GatewayError::internal(e.to_string()))
    }

    /// Decode from wire JSON text
    pub fn from_json(text: &str) -> GatewayResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Serialize for TradeUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TradeUpdate", 3)?;
        state.serialize_field("type", &self.kind())?;
        match &self.payload {
            UpdatePayload::Execution(request) => state.serialize_field("data", request)?,
            UpdatePayload::PositionUpdate(position) | UpdatePayload::Liquidation(position) => {
                state.serialize_field("data", position)?
            }
            UpdatePayload::Error(error) => state.serialize_field("data", error)?,
            UpdatePayload::TrailingStopHit(hit) => state.serialize_field("data", hit)?,
        }
        state.serialize_field("timestamp", &self.timestamp)?;
        state.end()
    }
}

/// Untyped wire form, checked against `type` on conversion
#[derive(Deserialize)]
struct RawTradeUpdate {
    #[serde(rename = "type")]
    kind: UpdateType,
    data: Value,
    timestamp: i64,
}

impl TryFrom<RawTradeUpdate> for TradeUpdate {
    type Error = serde_json::Error;

    fn try_from(raw: RawTradeUpdate) -> Result<Self, Self::Error> {
        let payload = match raw.kind {
            UpdateType::Execution => UpdatePayload::Execution(serde_json::from_value(raw.data)?),
            UpdateType::PositionUpdate => {
                UpdatePayload::PositionUpdate(serde_json::from_value(raw.data)?)
            }
            UpdateType::Liquidation => UpdatePayload::Liquidation(serde_json::from_value(raw.data)?),
            UpdateType::Error => UpdatePayload::Error(serde_json::from_value(raw.data)?),
            UpdateType::TrailingStopHit => {
                UpdatePayload::TrailingStopHit(serde_json::from_value(raw.data)?)
            }
        };

        Ok(TradeUpdate {
            payload,
            timestamp: raw.timestamp,
        })
    }
}
