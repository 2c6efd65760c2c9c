//! Market data structures

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price level, encoded on the wire as `[price, size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel(pub Decimal, pub Decimal);

impl OrderBookLevel {
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self(price, size)
    }

    pub fn price(&self) -> Decimal {
        self.0
    }

    pub fn size(&self) -> Decimal {
        self.1
    }
}

/// Order book for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    /// Bid levels, best (highest) first
    pub bids: Vec<OrderBookLevel>,
    /// Ask levels, best (lowest) first
    pub asks: Vec<OrderBookLevel>,
}

impl OrderBook {
    /// An order book with no levels
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price())
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price())
    }

    /// Best ask minus best bid, when both sides have liquidity
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }
}
