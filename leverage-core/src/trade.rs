//! Trade request types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GatewayError, GatewayResult};

/// Direction of a leveraged trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    /// Open or add to a long position
    Long,
    /// Open or add to a short position
    Short,
    /// Close an existing position
    Close,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeAction::Long => "LONG",
            TradeAction::Short => "SHORT",
            TradeAction::Close => "CLOSE",
        };
        write!(f, "{}", s)
    }
}

/// A validated order, ready to hand to the trading backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRequest {
    pub action: TradeAction,

    /// Trading pair symbol (e.g., "ETH-USD")
    pub symbol: String,

    /// Order amount in quote currency
    pub amount: Decimal,

    /// Leverage multiplier
    pub leverage: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
}

impl TradeRequest {
    /// Close the whole position on `symbol`.
    ///
    /// A zero amount means "everything"; this request never passes through
    /// client validation.
    pub fn close_all(symbol: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Close,
            symbol: symbol.into(),
            amount: Decimal::ZERO,
            leverage: Decimal::ONE,
            stop_loss: None,
            take_profit: None,
        }
    }
}

/// An order as submitted by a client, before validation
///
/// Every field is optional so that a request with missing fields still
/// reaches the handler and can be reported as a validation error instead of
/// being rejected by the JSON extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDraft {
    #[serde(default)]
    pub action: Option<TradeAction>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub leverage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
}

impl TradeDraft {
    /// Check required fields and produce a [`TradeRequest`]
    ///
    /// `symbol` must be non-empty; `amount` and `leverage` must be present and
    /// strictly positive. All offending fields are listed in the error.
    pub fn validate(self) -> GatewayResult<TradeRequest> {
        let mut missing = Vec::new();

        if self.action.is_none() {
            missing.push("action");
        }
        if self.symbol.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("symbol");
        }
        if !self.amount.is_some_and(|a| a > Decimal::ZERO) {
            missing.push("amount");
        }
        if !self.leverage.is_some_and(|l| l > Decimal::ZERO) {
            missing.push("leverage");
        }

        match (self.action, self.symbol, self.amount, self.leverage) {
            (Some(action), Some(symbol), Some(amount), Some(leverage)) if missing.is_empty() => {
                Ok(TradeRequest {
                    action,
                    symbol,
                    amount,
                    leverage,
                    stop_loss: self.stop_loss,
                    take_profit: self.take_profit,
                })
            }
            _ => Err(GatewayError::validation(format!(
                "Missing or invalid trade fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

impl From<TradeRequest> for TradeDraft {
    fn from(req: TradeRequest) -> Self {
        Self {
            action: Some(req.action),
            symbol: Some(req.symbol),
            amount: Some(req.amount),
            leverage: Some(req.leverage),
            stop_loss: req.stop_loss,
            take_profit: req.take_profit,
        }
    }
}
