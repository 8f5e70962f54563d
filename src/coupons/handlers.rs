// HTTP handlers for coupon endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::coupons::{
    Coupon, CouponError, IssueCouponRequest, IssueCouponResponse, UpdateCouponRequest,
};
use crate::scope::MerchantScope;
use crate::AppState;

/// Handler for POST /api/coupons
/// Issues a coupon; returns 201 whether the row was created or reactivated
pub async fn issue_coupon_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Json(request): Json<IssueCouponRequest>,
) -> Result<(StatusCode, Json<IssueCouponResponse>), CouponError> {
    let (coupon, action) = state
        .coupon_service
        .issue(scope.merchant_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueCouponResponse { action, coupon }),
    ))
}

/// Handler for GET /api/coupons/:id
pub async fn get_coupon_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(coupon_id): Path<i64>,
) -> Result<Json<Coupon>, CouponError> {
    let coupon = state
        .coupon_service
        .get_coupon(coupon_id, scope.merchant_id)
        .await?;

    Ok(Json(coupon))
}

/// Handler for PUT /api/coupons/:id
/// Updates a coupon; status changes go through the transition machine
pub async fn update_coupon_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(coupon_id): Path<i64>,
    Json(request): Json<UpdateCouponRequest>,
) -> Result<Json<Coupon>, CouponError> {
    let coupon = state
        .coupon_service
        .update(coupon_id, scope.merchant_id, request)
        .await?;

    Ok(Json(coupon))
}

/// Handler for DELETE /api/coupons/:id
/// Revokes a coupon (soft delete), freeing its code
pub async fn revoke_coupon_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(coupon_id): Path<i64>,
) -> Result<StatusCode, CouponError> {
    state
        .coupon_service
        .revoke(coupon_id, scope.merchant_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/customers/:id/coupons
pub async fn list_coupons_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(loyalty_customer_id): Path<i64>,
) -> Result<Json<Vec<Coupon>>, CouponError> {
    let coupons = state
        .coupon_service
        .list_for_customer(loyalty_customer_id, scope.merchant_id)
        .await?;

    Ok(Json(coupons))
}
