//! Trading backend seam
//!
//! Every call the gateway makes into the leveraged-trading SDK goes through
//! [`ExecutionBackend`]. The [`PlaceholderBackend`] stands in until a real
//! SDK client is wired up.

use async_trait::async_trait;
use leverage_core::{GatewayResult, OrderBook, Position, TradeRequest};
use rust_decimal::Decimal;
use tracing::debug;

/// Operations the gateway needs from a trading backend
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Submit an order
    async fn execute(&self, request: &TradeRequest) -> GatewayResult<()>;

    /// Fetch all open positions
    async fn positions(&self) -> GatewayResult<Vec<Position>>;

    /// Fetch the order book for a symbol
    async fn order_book(&self, symbol: &str) -> GatewayResult<OrderBook>;

    /// Fetch the latest price for a symbol
    async fn price(&self, symbol: &str) -> GatewayResult<Decimal>;
}

/// Backend that accepts every order and reports no market data
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderBackend;

#[async_trait]
impl ExecutionBackend for PlaceholderBackend {
    async fn execute(&self, request: &TradeRequest) -> GatewayResult<()> {
        debug!(
            "Placeholder backend accepted {} {} x{} on {}",
            request.action, request.amount, request.leverage, request.symbol
        );
        Ok(())
    }

    async fn positions(&self) -> GatewayResult<Vec<Position>> {
        Ok(Vec::new())
    }

    async fn order_book(&self, symbol: &str) -> GatewayResult<OrderBook> {
        Ok(OrderBook::empty(symbol))
    }

    async fn price(&self, _symbol: &str) -> GatewayResult<Decimal> {
        Ok(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_returns_empty_data() {
        let backend = PlaceholderBackend;

        assert!(backend.positions().await.unwrap().is_empty());

        let book = backend.order_book("ETH-USD").await.unwrap();
        assert_eq!(book.symbol, "ETH-USD");
        assert!(book.bids.is_empty());
        assert!(book.asks.is_empty());

        assert_eq!(backend.price("ETH-USD").await.unwrap(), Decimal::ZERO);
    }
}
