//! Position sizing and trailing stop endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use leverage_core::{GatewayError, PositionSizing, TrailingStopConfig};
use leverage_services::SizingParams;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

/// Request to size a position from a risk budget
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingRequest {
    pub symbol: String,
    pub account_value: Decimal,
    /// Fraction of the account to risk (0.01 = 1%)
    pub risk_percent: Decimal,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    #[serde(default)]
    pub max_leverage: Option<Decimal>,
    #[serde(default)]
    pub max_position_percent: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct SizingResponse {
    pub status: &'static str,
    pub sizing: PositionSizing,
}

/// Request to install a trailing stop
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailingStopRequest {
    pub symbol: String,
    /// Trail distance as a fraction of the high-water mark (0.02 = 2%)
    pub trail_percent: Decimal,
    /// Falls back to the backend price when omitted
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub activation_price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailingStopResponse {
    pub status: &'static str,
    pub trailing_stop: TrailingStopConfig,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

/// Create risk routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sizing", post(calculate_sizing))
        .route("/trailing-stop", post(set_trailing_stop))
        .route(
            "/trailing-stop/{symbol}",
            get(get_trailing_stop).delete(remove_trailing_stop),
        )
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError(GatewayError::validation(rejection.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

async fn calculate_sizing(
    State(state): State<AppState>,
    payload: Result<Json<SizingRequest>, JsonRejection>,
) -> ApiResult<Json<SizingResponse>> {
    let Json(req) = payload.map_err(invalid_body)?;

    let mut params = SizingParams::new(
        req.account_value,
        req.risk_percent,
        req.entry_price,
        req.stop_loss,
    );
    if let Some(max_leverage) = req.max_leverage {
        params.max_leverage = max_leverage;
    }
    if let Some(max_position_percent) = req.max_position_percent {
        params.max_position_percent = max_position_percent;
    }

    let sizing = state
        .position_manager
        .calculate_position_size(&req.symbol, &params)?;

    Ok(Json(SizingResponse {
        status: "success",
        sizing,
    }))
}

async fn set_trailing_stop(
    State(state): State<AppState>,
    payload: Result<Json<TrailingStopRequest>, JsonRejection>,
) -> ApiResult<Json<TrailingStopResponse>> {
    let Json(req) = payload.map_err(invalid_body)?;

    let current_price = match req.current_price {
        Some(price) => price,
        None => state.trade_service.price(&req.symbol).await?,
    };

    let trailing_stop = state.position_manager.set_trailing_stop(
        &req.symbol,
        req.trail_percent,
        current_price,
        req.activation_price,
    )?;

    Ok(Json(TrailingStopResponse {
        status: "success",
        trailing_stop,
    }))
}

async fn get_trailing_stop(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<TrailingStopResponse>> {
    let trailing_stop = state
        .position_manager
        .get_trailing_stop(&symbol)
        .ok_or_else(|| GatewayError::not_found(format!("No trailing stop for {}", symbol)))?;

    Ok(Json(TrailingStopResponse {
        status: "success",
        trailing_stop,
    }))
}

async fn remove_trailing_stop(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .position_manager
        .remove_trailing_stop(&symbol)
        .ok_or_else(|| GatewayError::not_found(format!("No trailing stop for {}", symbol)))?;

    info!("Trailing stop removed for {}", symbol);

    Ok(Json(MessageResponse {
        status: "success",
        message: format!("Trailing stop removed for {}", symbol),
    }))
}
