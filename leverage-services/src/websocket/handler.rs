//! WebSocket connection handler
//!
//! Drives a single real-time connection: registers it, forwards queued
//! updates to the socket, interprets inbound frames and unregisters on
//! close.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use leverage_core::{ClientMessage, TradeUpdate};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::registry::{ClientId, ConnectionRegistry};
use crate::trade_service::TradeService;

/// Transport-neutral inbound WebSocket frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping,
    Pong,
    Close,
}

/// Shared state for WebSocket handlers
#[derive(Clone)]
pub struct RealtimeHandler {
    registry: Arc<ConnectionRegistry>,
    trade_service: Arc<TradeService>,
}

impl RealtimeHandler {
    pub fn new(registry: Arc<ConnectionRegistry>, trade_service: Arc<TradeService>) -> Self {
        Self {
            registry,
            trade_service,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handle an established WebSocket connection until it closes
    ///
    /// `inbound` yields frames from the client; `outbound` receives the JSON
    /// text of every update addressed to it. The connection is unregistered
    /// before this returns.
    pub async fn handle_connection<R, W, E>(&self, mut inbound: R, mut outbound: W)
    where
        R: Stream<Item = Result<Frame, E>> + Unpin,
        E: Display,
        W: Sink<String> + Unpin + Send + 'static,
    {
        let (client_id, mut outgoing_rx) = self.registry.register();
        info!("New WebSocket connection: {}", client_id);

        // Task: Send queued updates to the WebSocket
        let send_task = tokio::spawn(async move {
            while let Some(frame) = outgoing_rx.recv().await {
                if outbound.send(frame).await.is_err() {
                    break;
                }
            }
        });

        while let Some(result) = inbound.next().await {
            match result {
                Ok(Frame::Close) => {
                    debug!("Received close from {}", client_id);
                    break;
                }
                Ok(frame) => self.handle_frame(client_id, frame).await,
                Err(e) => {
                    debug!("WebSocket error for {}: {}", client_id, e);
                    break;
                }
            }
        }

        self.registry.unregister(client_id);
        send_task.abort();
        info!("WebSocket connection closed: {}", client_id);
    }

    /// Handle one inbound frame from `client_id`
    pub async fn handle_frame(&self, client_id: ClientId, frame: Frame) {
        match frame {
            Frame::Text(text) => self.handle_text(client_id, &text).await,
            Frame::Binary(_) => {
                self.reply_error(client_id, "Binary messages not supported");
            }
            Frame::Ping | Frame::Pong => {
                debug!("Received ping/pong from {}", client_id);
            }
            Frame::Close => {}
        }
    }

    /// Handle an inbound text message from `client_id`
    ///
    /// Errors go back to the sender only; a successful `TRADE` is broadcast
    /// to every connection, the sender included.
    pub async fn handle_text(&self, client_id: ClientId, text: &str) {
        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Invalid message from {}: {}", client_id, e);
                self.reply_error(client_id, e.to_string());
                return;
            }
        };

        match message {
            ClientMessage::Trade(draft) => {
                if let Err(e) = self.trade_service.submit(draft).await {
                    warn!("Trade from {} failed: {}", client_id, e);
                    self.reply_error(client_id, e.to_string());
                }
            }
            ClientMessage::Unsupported(kind) => {
                debug!("Unsupported message type {} from {}", kind, client_id);
                self.reply_error(client_id, format!("Unsupported message type: {}", kind));
            }
        }
    }

    fn reply_error(&self, client_id: ClientId, message: impl Into<String>) {
        self.trade_service
            .broadcaster()
            .send_to(client_id, &TradeUpdate::error(message));
    }
}

impl std::fmt::Debug for RealtimeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHandler")
            .field("registry", &self.registry)
            .finish()
    }
}
