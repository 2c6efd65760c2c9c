//! Trade execution service
//!
//! The one execution path shared by the HTTP and real-time surfaces: call
//! the backend, build the `EXECUTION` update, broadcast it.

use leverage_core::{
    GatewayResult, OrderBook, Position, TradeDraft, TradeRequest, TradeUpdate,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::ExecutionBackend;
use crate::position_manager::PositionManager;
use crate::websocket::Broadcaster;

/// Orchestrates backend calls and update broadcasts
#[derive(Clone)]
pub struct TradeService {
    backend: Arc<dyn ExecutionBackend>,
    broadcaster: Broadcaster,
    position_manager: Arc<PositionManager>,
}

impl TradeService {
    pub fn new(
        backend: Arc<dyn ExecutionBackend>,
        broadcaster: Broadcaster,
        position_manager: Arc<PositionManager>,
    ) -> Self {
        Self {
            backend,
            broadcaster,
            position_manager,
        }
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn position_manager(&self) -> &Arc<PositionManager> {
        &self.position_manager
    }

    /// Validate a client draft and execute it
    pub async fn submit(&self, draft: TradeDraft) -> GatewayResult<TradeUpdate> {
        let request = draft.validate()?;
        self.execute(request).await
    }

    /// Execute a validated order and broadcast the `EXECUTION` update
    pub async fn execute(&self, request: TradeRequest) -> GatewayResult<TradeUpdate> {
        self.backend.execute(&request).await?;

        info!(
            "Executed {} {} x{} on {}",
            request.action, request.amount, request.leverage, request.symbol
        );

        let update = TradeUpdate::execution(request);
        self.broadcaster.broadcast(&update);
        Ok(update)
    }

    /// Broadcast an `ERROR` update to every client
    pub fn report_error(&self, message: impl Into<String>) -> TradeUpdate {
        let update = TradeUpdate::error(message);
        warn!("Broadcasting error: {:?}", update.payload);
        self.broadcaster.broadcast(&update);
        update
    }

    /// Open positions, with any known trailing stop and sizing attached
    pub async fn positions(&self) -> GatewayResult<Vec<Position>> {
        let mut positions = self.backend.positions().await?;

        for position in positions.iter_mut() {
            if position.trailing_stop.is_none() {
                position.trailing_stop = self.position_manager.get_trailing_stop(&position.symbol);
            }
            if position.sizing.is_none() {
                position.sizing = self.position_manager.get_position_size(&position.symbol);
            }
        }

        Ok(positions)
    }

    pub async fn order_book(&self, symbol: &str) -> GatewayResult<OrderBook> {
        self.backend.order_book(symbol).await
    }

    pub async fn price(&self, symbol: &str) -> GatewayResult<Decimal> {
        self.backend.price(symbol).await
    }
}

impl std::fmt::Debug for TradeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeService")
            .field("broadcaster", &self.broadcaster)
            .finish()
    }
}
