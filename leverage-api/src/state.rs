//! Application state shared across handlers

use leverage_services::{
    Broadcaster, ConnectionRegistry, ExecutionBackend, PositionManager, RealtimeHandler,
    TradeService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub position_manager: Arc<PositionManager>,
    pub trade_service: Arc<TradeService>,
    pub realtime: RealtimeHandler,
}

impl AppState {
    /// Wire the registry, broadcaster and services around `backend`
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let position_manager = Arc::new(PositionManager::new());
        let trade_service = Arc::new(TradeService::new(
            backend,
            Broadcaster::new(Arc::clone(&registry)),
            Arc::clone(&position_manager),
        ));
        let realtime = RealtimeHandler::new(Arc::clone(&registry), Arc::clone(&trade_service));

        Self {
            registry,
            position_manager,
            trade_service,
            realtime,
        }
    }
}
