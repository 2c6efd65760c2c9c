//! Trade execution and market data endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use leverage_core::{GatewayError, OrderBook, Position, TradeDraft, TradeUpdate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub data: TradeUpdate,
}

#[derive(Debug, Serialize)]
pub struct PositionsResponse {
    pub status: &'static str,
    pub positions: Vec<Position>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookResponse {
    pub status: &'static str,
    pub order_book: OrderBook,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub status: &'static str,
    pub symbol: String,
    pub price: Decimal,
}

/// Create trading routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/execute", post(execute_trade))
        .route("/positions", get(get_positions))
        .route("/orderbook/{symbol}", get(get_orderbook))
        .route("/price/{symbol}", get(get_price))
}

// ============================================================================
// Handlers
// ============================================================================

/// Validate and execute a trade
///
/// Any failure is broadcast to every client as an `ERROR` update before the
/// error response is returned.
async fn execute_trade(
    State(state): State<AppState>,
    payload: Result<Json<TradeDraft>, JsonRejection>,
) -> ApiResult<Json<ExecuteResponse>> {
    let result = match payload {
        Ok(Json(draft)) => state.trade_service.submit(draft).await,
        Err(rejection) => Err(GatewayError::validation(rejection.body_text())),
    };

    match result {
        Ok(update) => Ok(Json(ExecuteResponse {
            status: "success",
            message: "Trade executed",
            data: update,
        })),
        Err(e) => {
            warn!("Trade execution failed: {}", e);
            state.trade_service.report_error(e.to_string());
            Err(ApiError(e))
        }
    }
}

async fn get_positions(State(state): State<AppState>) -> ApiResult<Json<PositionsResponse>> {
    let positions = state.trade_service.positions().await?;
    info!("Returning {} positions", positions.len());

    Ok(Json(PositionsResponse {
        status: "success",
        positions,
    }))
}

async fn get_orderbook(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<OrderBookResponse>> {
    let order_book = state.trade_service.order_book(&symbol).await?;

    Ok(Json(OrderBookResponse {
        status: "success",
        order_book,
    }))
}

async fn get_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<PriceResponse>> {
    let price = state.trade_service.price(&symbol).await?;

    Ok(Json(PriceResponse {
        status: "success",
        symbol,
        price,
    }))
}
