//! Product catalog endpoints.
//!
//! Reads are public; writes require the admin role.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::{CatalogStore, Product, ProductCategory, ProductPatch};
use common::{Money, ProductId};
use ledger::OrderStore;
use serde::Deserialize;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub id: ProductId,
    pub name: String,
    pub category: ProductCategory,
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

/// GET /products — list the catalog, optionally filtered by category.
#[tracing::instrument(skip(state, query))]
pub async fn list<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let category = match query.category.as_deref() {
        Some(raw) => Some(ProductCategory::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("unknown category: {raw}"))
        })?),
        None => None,
    };

    let mut products = state.catalog.list().await?;
    if let Some(category) = category {
        products.retain(|p| p.category == category);
    }
    Ok(Json(products))
}

/// GET /products/:id — fetch one product.
#[tracing::instrument(skip(state))]
pub async fn get<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .catalog
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// POST /products — add a product to the catalog. Admin only.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.user_id))]
pub async fn create<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    principal.require_admin()?;

    let product = Product::new(
        req.id,
        req.name,
        req.category,
        req.price,
        req.stock,
        req.image_url,
        req.description,
    )?;
    state.catalog.insert(product.clone()).await?;

    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /products/:id — partially update a product. Admin only.
#[tracing::instrument(skip(state, patch), fields(user_id = %principal.user_id))]
pub async fn update<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    principal.require_admin()?;

    let product = state.catalog.update(&id, patch).await?;
    Ok(Json(product))
}

/// DELETE /products/:id — remove a product. Admin only.
#[tracing::instrument(skip(state), fields(user_id = %principal.user_id))]
pub async fn remove<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, ApiError> {
    principal.require_admin()?;

    state.catalog.remove(&id).await?;
    tracing::info!(product_id = %id, "product removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /products/:id/restock — add stock to a product. Admin only.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.user_id))]
pub async fn restock<C: CatalogStore + 'static, S: OrderStore + Clone>(
    State(state): State<Arc<AppState<C, S>>>,
    principal: Principal,
    Path(id): Path<ProductId>,
    Json(req): Json<RestockRequest>,
) -> Result<Json<Product>, ApiError> {
    principal.require_admin()?;

    if req.quantity == 0 {
        return Err(ApiError::BadRequest(
            "restock quantity must be greater than 0".to_string(),
        ));
    }

    state.catalog.increment(&id, req.quantity).await?;
    let product = state
        .catalog
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    tracing::info!(product_id = %id, quantity = req.quantity, "product restocked");
    Ok(Json(product))
}
