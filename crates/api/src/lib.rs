//! HTTP API server for the storefront backend.
//!
//! Exposes the catalog, order, and payment endpoints over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use catalog::{CatalogStore, InMemoryCatalog, PostgresCatalog};
use fulfillment::FulfillmentService;
use ledger::{InMemoryOrderStore, OrderLedger, OrderStore, PostgresOrderStore};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::{MockGateway, PaymentReconciler, SignatureVerifier};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C: CatalogStore + 'static, S: OrderStore + Clone + 'static>(
    state: Arc<AppState<C, S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<C, S>))
        .route("/products", post(routes::products::create::<C, S>))
        .route("/products/{id}", get(routes::products::get::<C, S>))
        .route("/products/{id}", patch(routes::products::update::<C, S>))
        .route("/products/{id}", delete(routes::products::remove::<C, S>))
        .route(
            "/products/{id}/restock",
            post(routes::products::restock::<C, S>),
        )
        .route("/orders", post(routes::orders::place::<C, S>))
        .route("/orders", get(routes::orders::mine::<C, S>))
        .route("/orders/{id}", get(routes::orders::get::<C, S>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::set_status::<C, S>),
        )
        .route("/admin/orders", get(routes::orders::admin_list::<C, S>))
        .route("/admin/stats", get(routes::orders::admin_stats::<C, S>))
        .route(
            "/payments/order",
            post(routes::payments::create_gateway_order::<C, S>),
        )
        .route("/payments/verify", post(routes::payments::verify::<C, S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the in-memory stores, with the mock
/// payment gateway. Used by tests and local development.
pub fn create_default_state(config: &Config) -> Arc<AppState<InMemoryCatalog, InMemoryOrderStore>> {
    let catalog = Arc::new(InMemoryCatalog::new());
    let ledger = OrderLedger::new(InMemoryOrderStore::new());
    assemble_state(catalog, ledger, config)
}

/// Creates application state backed by PostgreSQL.
pub fn create_postgres_state(
    pool: PgPool,
    config: &Config,
) -> Arc<AppState<PostgresCatalog, PostgresOrderStore>> {
    let catalog = Arc::new(PostgresCatalog::new(pool.clone()));
    let ledger = OrderLedger::new(PostgresOrderStore::new(pool));
    assemble_state(catalog, ledger, config)
}

fn assemble_state<C: CatalogStore + 'static, S: OrderStore + Clone>(
    catalog: Arc<C>,
    ledger: OrderLedger<S>,
    config: &Config,
) -> Arc<AppState<C, S>> {
    let verifier = SignatureVerifier::from_config(&config.gateway);
    Arc::new(AppState {
        fulfillment: FulfillmentService::new(Arc::clone(&catalog), ledger.clone()),
        reconciler: PaymentReconciler::new(ledger.clone(), verifier),
        gateway: Arc::new(MockGateway::new()),
        gateway_key_id: config.gateway.key_id.clone(),
        catalog,
        ledger,
    })
}
