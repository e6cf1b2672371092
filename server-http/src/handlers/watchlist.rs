use crate::api::{api_error, from_core_error, AddWatchlistRequest, ApiError, WatchlistResponse};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use coinwatch::auth::AuthenticatedUser;
use coinwatch::domain::MarketSnapshot;
use tracing::{info, warn};

/// POST /crypto/watchlist
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<AddWatchlistRequest>, JsonRejection>,
) -> Result<Json<WatchlistResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| {
        warn!("Rejected watchlist body: {}", rejection);
        api_error(
            StatusCode::BAD_REQUEST,
            "Request body must be JSON with coinId and coinName",
        )
    })?;

    info!("ADD watchlist: user={}, coin={}", user.user_id, req.coin_id);

    let watchlist = state
        .watchlists
        .add(&user.user_id, &req.coin_id, &req.coin_name)
        .await
        .map_err(|e| from_core_error(&e, "Failed to add coin to watchlist"))?;

    Ok(Json(WatchlistResponse::new("Coin added to watchlist", watchlist)))
}

/// DELETE /crypto/watchlist/:coin_id
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(coin_id): Path<String>,
) -> Result<Json<WatchlistResponse>, ApiError> {
    info!("REMOVE watchlist: user={}, coin={}", user.user_id, coin_id);

    let watchlist = state
        .watchlists
        .remove(&user.user_id, &coin_id)
        .await
        .map_err(|e| from_core_error(&e, "Failed to remove coin from watchlist"))?;

    Ok(Json(WatchlistResponse::new("Coin removed from watchlist", watchlist)))
}

/// GET /crypto/watchlist
pub async fn get_watchlist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<MarketSnapshot>, ApiError> {
    info!("GET watchlist: user={}", user.user_id);

    let rows = state
        .watchlists
        .list(&user.user_id)
        .await
        .map_err(|e| from_core_error(&e, "Failed to fetch watchlist data"))?;

    Ok(Json(rows))
}
