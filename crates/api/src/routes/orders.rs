//! Order placement, queries, and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::CatalogStore;
use chrono::{DateTime, Utc};
use common::{Money, OrderId};
use fulfillment::OrderItemRequest;
use ledger::{Order, OrderFilter, OrderStatus, OrderStore, PaymentMethod};
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub address: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub paid_revenue: Money,
    pub total_products: u64,
}

#[derive(Deserialize)]
pub struct AdminOrderQuery {
    pub status: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// POST /orders — place an order.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.user_id))]
pub async fn place<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .fulfillment
        .place_order(principal.user_id, req.items, &req.address, req.payment_method)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — list the caller's own orders, newest first.
#[tracing::instrument(skip(state), fields(user_id = %principal.user_id))]
pub async fn mine<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.ledger.orders_for_user(principal.user_id).await?;
    Ok(Json(orders))
}

/// GET /orders/:id — fetch one order.
///
/// Customers can only see their own orders; a non-owner gets the same
/// response as a missing order.
#[tracing::instrument(skip(state), fields(user_id = %principal.user_id))]
pub async fn get<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .ledger
        .get(id)
        .await?
        .filter(|o| principal.role.is_admin() || o.user_id == principal.user_id)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order))
}

/// PATCH /orders/:id/status — move an order along its lifecycle. Admin only.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.user_id))]
pub async fn set_status<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
    let target = OrderStatus::parse(&req.status)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {}", req.status)))?;

    let order = state
        .fulfillment
        .set_status(principal.role, id, target)
        .await?;
    Ok(Json(order))
}

/// GET /admin/orders — list orders matching a filter. Admin only.
#[tracing::instrument(skip(state, query), fields(user_id = %principal.user_id))]
pub async fn admin_list<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Query(query): Query<AdminOrderQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    principal.require_admin()?;

    let status = match query.status.as_deref() {
        Some(raw) => Some(
            OrderStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {raw}")))?,
        ),
        None => None,
    };

    let orders = state
        .ledger
        .query(OrderFilter {
            status,
            created_from: query.created_from,
            created_to: query.created_to,
            limit: query.limit,
        })
        .await?;
    Ok(Json(orders))
}

/// GET /admin/stats — aggregate order figures. Admin only.
#[tracing::instrument(skip(state), fields(user_id = %principal.user_id))]
pub async fn admin_stats<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
) -> Result<Json<StatsResponse>, ApiError> {
    principal.require_admin()?;

    let stats = state.ledger.stats().await?;
    let total_products = state.catalog.count().await?;
    Ok(Json(StatsResponse {
        total_orders: stats.total_orders,
        pending_orders: stats.pending_orders,
        paid_revenue: stats.paid_revenue,
        total_products,
    }))
}
