//! Position and risk tracking structures

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of a held position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

/// A leveraged position held on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Trading pair symbol
    pub symbol: String,

    /// Position size in base units
    pub size: Decimal,

    /// Leverage the position was opened with
    pub leverage: Decimal,

    /// Average entry price
    pub entry_price: Decimal,

    /// Price at which the backend would liquidate
    pub liquidation_price: Decimal,

    /// Unrealized profit/loss
    pub unrealized_pnl: Decimal,

    pub side: PositionSide,

    /// Trailing stop attached to this symbol, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_stop: Option<TrailingStopConfig>,

    /// Sizing used when the position was opened, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizing: Option<PositionSizing>,
}

impl Position {
    /// Notional value at the entry price
    pub fn notional(&self) -> Decimal {
        self.size * self.entry_price
    }
}

/// Trailing stop that follows the price upward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailingStopConfig {
    /// Price at which the stop starts trailing (immediately if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_price: Option<Decimal>,

    /// Distance kept below the high water mark, as a fraction (0.02 = 2%)
    pub trail_percent: Decimal,

    /// Current stop price
    pub current_stop: Decimal,

    /// Highest price seen since activation
    pub high_water_mark: Decimal,

    /// Whether the stop is trailing yet
    #[serde(default)]
    pub is_active: bool,
}

/// Result of a risk-based position size calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSizing {
    /// Fraction of the account put at risk (0.01 = 1%)
    pub risk_percent: Decimal,
    pub account_value: Decimal,
    /// Cap on the position size given the leverage
    pub max_position_size: Decimal,
    pub position_size: Decimal,
    pub leverage: Decimal,
}
