use crate::api::{from_core_error, ApiError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use coinwatch::domain::{CoinDetail, MarketSnapshot};
use tracing::info;

/// GET /crypto/top
pub async fn top_coins(State(state): State<AppState>) -> Result<Json<MarketSnapshot>, ApiError> {
    info!("GET top coins");

    let rows = state
        .market
        .top_coins()
        .await
        .map_err(|e| from_core_error(&e, "Failed to fetch top coins"))?;

    Ok(Json(rows))
}

/// GET /crypto/coin/:id
pub async fn coin_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CoinDetail>, ApiError> {
    info!("GET coin detail: id={}", id);

    let detail = state
        .market
        .coin_detail(&id)
        .await
        .map_err(|e| from_core_error(&e, "Failed to fetch coin details"))?;

    Ok(Json(detail))
}
