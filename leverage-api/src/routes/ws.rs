//! WebSocket upgrade handling
//!
//! Any request asking for a WebSocket upgrade joins the real-time channel,
//! whatever its path. The axum socket is adapted to the transport-neutral
//! frames the realtime handler works with.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        FromRequestParts, Request, State,
    },
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::{future, SinkExt, StreamExt};
use leverage_services::Frame;
use tracing::info;

use crate::AppState;

/// Middleware that upgrades WebSocket requests before path routing
pub async fn upgrade_any_path(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_websocket_upgrade(request.headers()) {
        return next.run(request).await;
    }

    let (mut parts, _body) = request.into_parts();
    match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(ws) => {
            info!("WebSocket upgrade request received on {}", parts.uri.path());
            ws.on_upgrade(move |socket| handle_socket(socket, state))
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Whether the headers ask for a WebSocket upgrade
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let upgrade = headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("websocket"));

    let connection = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| {
            value
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
        });

    upgrade && connection
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, receiver) = socket.split();

    let inbound = receiver.map(|msg| msg.map(into_frame));
    let outbound = sender.with(|text: String| {
        future::ready(Ok::<_, axum::Error>(Message::Text(text.into())))
    });

    state.realtime.handle_connection(inbound, outbound).await;
}

fn into_frame(msg: Message) -> Frame {
    match msg {
        Message::Text(text) => Frame::Text(text.as_str().to_owned()),
        Message::Binary(data) => Frame::Binary(data.to_vec()),
        Message::Ping(_) => Frame::Ping,
        Message::Pong(_) => Frame::Pong,
        Message::Close(_) => Frame::Close,
    }
}
