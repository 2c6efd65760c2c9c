//! Update broadcaster
//!
//! Encodes [`TradeUpdate`] envelopes once and fans them out through the
//! [`ConnectionRegistry`].

use leverage_core::TradeUpdate;
use std::sync::Arc;
use tracing::{debug, error};

use super::registry::{ClientId, ConnectionRegistry};

/// Fire-and-forget delivery of updates to real-time clients
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send an update to every open connection
    ///
    /// Returns the number of send attempts made. Callers are not told
    /// whether individual deliveries succeeded.
    pub fn broadcast(&self, update: &TradeUpdate) -> usize {
        let frame = match update.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to serialize {:?} update: {}", update.kind(), e);
                return 0;
            }
        };

        let attempts = self.registry.deliver_to_all(&frame);
        debug!("Broadcast {:?} update to {} client(s)", update.kind(), attempts);
        attempts
    }

    /// Send an update to a single connection
    pub fn send_to(&self, client_id: ClientId, update: &TradeUpdate) -> bool {
        match update.to_json() {
            Ok(frame) => self.registry.deliver_to(client_id, &frame),
            Err(e) => {
                error!("Failed to serialize {:?} update for {}: {}", update.kind(), client_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leverage_core::{TradeAction, TradeRequest, UpdateType};
    use rust_decimal_macros::dec;

    fn execution() -> TradeUpdate {
        TradeUpdate::execution(TradeRequest {
            action: TradeAction::Long,
            symbol: "BTC".to_string(),
            amount: dec!(1),
            leverage: dec!(5),
            stop_loss: None,
            take_profit: None,
        })
    }

    #[test]
    fn test_broadcast_reaches_every_open_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let mut receivers: Vec<_> = (0..5).map(|_| registry.register().1).collect();
        let update = execution();

        assert_eq!(broadcaster.broadcast(&update), 5);

        for rx in receivers.iter_mut() {
            let frame = rx.try_recv().unwrap();
            let decoded = TradeUpdate::from_json(&frame).unwrap();
            assert_eq!(decoded, update);
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_broadcast_skips_closed_connections() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let (_open, mut open_rx) = registry.register();
        let (_closed, closed_rx) = registry.register();
        drop(closed_rx);

        assert_eq!(broadcaster.broadcast(&execution()), 1);
        assert!(open_rx.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_with_no_clients() {
        let broadcaster = Broadcaster::new(Arc::new(ConnectionRegistry::new()));
        assert_eq!(broadcaster.broadcast(&execution()), 0);
    }

    #[test]
    fn test_send_to_targets_one_client() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let (a, mut rx_a) = registry.register();
        let (_b, mut rx_b) = registry.register();

        assert!(broadcaster.send_to(a, &TradeUpdate::error("nope")));

        let frame = rx_a.try_recv().unwrap();
        assert_eq!(TradeUpdate::from_json(&frame).unwrap().kind(), UpdateType::Error);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_unregister_during_broadcast() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        let ids: Vec<_> = (0..50)
            .map(|_| {
                let (id, rx) = registry.register();
                // Drain each queue so it stays open until unregistered
                tokio::spawn(async move {
                    let mut rx = rx;
                    while rx.recv().await.is_some() {}
                });
                id
            })
            .collect();

        let remover = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for id in ids {
                    registry.unregister(id);
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..50 {
            broadcaster.broadcast(&execution());
            tokio::task::yield_now().await;
        }

        remover.await.unwrap();
        assert!(registry.is_empty());
        assert_eq!(broadcaster.broadcast(&execution()), 0);
    }
}
