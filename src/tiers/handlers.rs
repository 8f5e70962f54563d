// HTTP handlers for tier catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::scope::MerchantScope;
use crate::tiers::{CreateTierRequest, LoyaltyTier, TierError, UpdateTierRequest};
use crate::AppState;

/// Handler for GET /api/programs/:program_id/tiers
pub async fn list_tiers_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(program_id): Path<i64>,
) -> Result<Json<Vec<LoyaltyTier>>, TierError> {
    let tiers = state
        .tier_service
        .list_tiers(program_id, scope.merchant_id)
        .await?;

    Ok(Json(tiers))
}

/// Handler for POST /api/programs/:program_id/tiers
pub async fn create_tier_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(program_id): Path<i64>,
    Json(request): Json<CreateTierRequest>,
) -> Result<(StatusCode, Json<LoyaltyTier>), TierError> {
    let tier = state
        .tier_service
        .create_tier(program_id, scope.merchant_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(tier)))
}

/// Handler for PUT /api/tiers/:id
pub async fn update_tier_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(tier_id): Path<i64>,
    Json(request): Json<UpdateTierRequest>,
) -> Result<Json<LoyaltyTier>, TierError> {
    let tier = state
        .tier_service
        .update_tier(tier_id, scope.merchant_id, request)
        .await?;

    Ok(Json(tier))
}

/// Handler for DELETE /api/tiers/:id
pub async fn delete_tier_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(tier_id): Path<i64>,
) -> Result<StatusCode, TierError> {
    state
        .tier_service
        .delete_tier(tier_id, scope.merchant_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
