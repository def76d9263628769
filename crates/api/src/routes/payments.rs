//! Payment gateway endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use catalog::CatalogStore;
use common::{Money, OrderId};
use ledger::OrderStore;
use payment::PaymentVerification;
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

const CURRENCY: &str = "INR";

#[derive(Deserialize)]
pub struct CreateGatewayOrderRequest {
    pub order_id: OrderId,
}

#[derive(Serialize)]
pub struct GatewayOrderResponse {
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
    pub key_id: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

/// POST /payments/order — create a gateway order for a local order.
///
/// The amount is taken from the ledger, never from the client.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.user_id))]
pub async fn create_gateway_order<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Json(req): Json<CreateGatewayOrderRequest>,
) -> Result<(StatusCode, Json<GatewayOrderResponse>), ApiError> {
    let order = state
        .ledger
        .get(req.order_id)
        .await?
        .filter(|o| principal.role.is_admin() || o.user_id == principal.user_id)
        .ok_or_else(|| ApiError::NotFound(format!("Order {} not found", req.order_id)))?;

    let gateway_order = state
        .gateway
        .create_order(order.total_amount, CURRENCY, &order.id.to_string())
        .await?;

    tracing::info!(
        order_id = %order.id,
        gateway_order_id = %gateway_order.gateway_order_id,
        "gateway order created"
    );
    Ok((
        StatusCode::CREATED,
        Json(GatewayOrderResponse {
            gateway_order_id: gateway_order.gateway_order_id,
            amount: gateway_order.amount,
            currency: gateway_order.currency,
            key_id: state.gateway_key_id.clone(),
        }),
    ))
}

/// POST /payments/verify — verify a gateway payment signature.
///
/// A valid signature marks the order paid and returns 200; any failure
/// returns 400 without saying why.
#[tracing::instrument(skip(state, verification))]
pub async fn verify<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    _principal: Principal,
    Json(verification): Json<PaymentVerification>,
) -> Result<(StatusCode, Json<VerifyResponse>), ApiError> {
    let verified = state.reconciler.verify_and_mark_paid(verification).await?;

    let status = if verified {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(VerifyResponse { verified })))
}
