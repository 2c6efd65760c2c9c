//! Trailing stop monitor
//!
//! Polls backend prices for every symbol with a trailing stop. When a stop
//! is crossed the position is closed and a `TRAILING_STOP_HIT` update is
//! broadcast.

use leverage_core::{TradeRequest, TradeUpdate};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::trade_service::TradeService;

/// Default polling interval (1 second)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Background task that enforces trailing stops
#[derive(Debug, Clone)]
pub struct TrailingStopMonitor {
    trade_service: Arc<TradeService>,
    poll_interval: Duration,
}

impl TrailingStopMonitor {
    pub fn new(trade_service: Arc<TradeService>, poll_interval: Duration) -> Self {
        Self {
            trade_service,
            poll_interval,
        }
    }

    /// Run until the task is aborted
    pub async fn run(self) {
        info!("Trailing stop monitor started (every {:?})", self.poll_interval);

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.check_once().await;
        }
    }

    /// Check every trailing stop once, returning the number that fired
    pub async fn check_once(&self) -> usize {
        let manager = self.trade_service.position_manager();
        let mut fired = 0;

        for symbol in manager.trailing_symbols() {
            let price = match self.trade_service.price(&symbol).await {
                Ok(price) if price > Decimal::ZERO => price,
                Ok(_) => {
                    debug!("No usable price for {}, skipping trailing stop check", symbol);
                    continue;
                }
                Err(e) => {
                    error!("Error fetching price for {}: {}", symbol, e);
                    continue;
                }
            };

            let Some(stop) = manager.update_trailing_stop(&symbol, price) else {
                continue;
            };

            info!(
                "Trailing stop hit for {}: price {} <= stop {}",
                symbol, price, stop.current_stop
            );

            if let Err(e) = self.trade_service.execute(TradeRequest::close_all(&symbol)).await {
                error!("Failed to close {} after trailing stop hit: {}", symbol, e);
                continue;
            }

            self.trade_service
                .broadcaster()
                .broadcast(&TradeUpdate::trailing_stop_hit(&symbol, price, stop.clone()));

            // A stop installed while the close was in flight stays
            if !manager.remove_trailing_stop_if_unchanged(&symbol, &stop) {
                info!("Trailing stop for {} was replaced during close, keeping it", symbol);
            }
            fired += 1;
        }

        fired
    }
}
