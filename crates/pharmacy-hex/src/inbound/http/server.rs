use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    serve, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::summary::InventorySummary;
use crate::application::Pharmacy;
use crate::errors::AppError;
use pharmacy_types::domain::medicine::{MedicineFilter, MedicinePatch, MedicineView, NewMedicine};
use pharmacy_types::domain::order::{OrderFilter, OrderPatch, OrderView};
use pharmacy_types::domain::validation::validate_status;
use pharmacy_types::ports::store::PharmacyStore;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub low_stock_threshold: i64,
}

pub struct HttpServer<S: PharmacyStore> {
    pub pharmacy: Arc<Pharmacy<S>>,
    pub config: HttpServerConfig,
}

struct AppState<S: PharmacyStore> {
    pharmacy: Arc<Pharmacy<S>>,
    low_stock_threshold: i64,
}

impl<S: PharmacyStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            pharmacy: self.pharmacy.clone(),
            low_stock_threshold: self.low_stock_threshold,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub medicine_id: Uuid,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub medicine_id: Option<Uuid>,
}

#[derive(Serialize)]
struct StatusResponse {
    id: Uuid,
    status: String,
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::BadRequest(format!("invalid id `{id}`: {e}")))
}

impl<S: PharmacyStore> HttpServer<S> {
    pub async fn new(pharmacy: Pharmacy<S>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            pharmacy: Arc::new(pharmacy),
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let state = AppState {
            pharmacy: self.pharmacy.clone(),
            low_stock_threshold: self.config.low_stock_threshold,
        };
        Router::new()
            .route("/health", get(health))
            .route("/api/summary", get(summary::<S>))
            .route(
                "/api/medicines",
                get(list_medicines::<S>).post(create_medicine::<S>),
            )
            .route(
                "/api/medicines/{id}",
                get(get_medicine::<S>)
                    .put(replace_medicine::<S>)
                    .patch(patch_medicine::<S>)
                    .delete(delete_medicine::<S>),
            )
            .route("/api/orders", get(list_orders::<S>).post(create_order::<S>))
            .route(
                "/api/orders/{id}",
                get(get_order::<S>)
                    .patch(patch_order::<S>)
                    .delete(delete_order::<S>),
            )
            .route("/api/orders/{id}/update_status", patch(update_status::<S>))
            .layer(trace_layer)
            .with_state(state)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn summary<S: PharmacyStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<InventorySummary>, AppError> {
    let summary = state.pharmacy.summary(state.low_stock_threshold).await?;
    Ok(Json(summary))
}

async fn list_medicines<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    filter: Result<Query<MedicineFilter>, QueryRejection>,
) -> Result<Json<Vec<MedicineView>>, AppError> {
    let Query(filter) = filter?;
    let list = state.pharmacy.catalog.list(filter).await?;
    tracing::debug!(count = list.len(), "listed medicines");
    Ok(Json(list.into_iter().map(MedicineView::from).collect()))
}

async fn create_medicine<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<NewMedicine>, JsonRejection>,
) -> Result<(StatusCode, Json<MedicineView>), AppError> {
    let Json(payload) = payload?;
    let medicine = state.pharmacy.catalog.create(payload).await?;
    Ok((StatusCode::CREATED, Json(medicine.into())))
}

async fn get_medicine<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<MedicineView>, AppError> {
    let medicine = state.pharmacy.catalog.get(parse_id(&id)?).await?;
    Ok(Json(medicine.into()))
}

async fn replace_medicine<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<NewMedicine>, JsonRejection>,
) -> Result<Json<MedicineView>, AppError> {
    let Json(payload) = payload?;
    let medicine = state
        .pharmacy
        .catalog
        .update(parse_id(&id)?, payload.into())
        .await?;
    Ok(Json(medicine.into()))
}

async fn patch_medicine<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<MedicinePatch>, JsonRejection>,
) -> Result<Json<MedicineView>, AppError> {
    let Json(payload) = payload?;
    let medicine = state
        .pharmacy
        .catalog
        .update(parse_id(&id)?, payload)
        .await?;
    Ok(Json(medicine.into()))
}

async fn delete_medicine<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.pharmacy.catalog.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_orders<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    query: Result<Query<OrderQuery>, QueryRejection>,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let Query(query) = query?;
    let status = query.status.as_deref().map(validate_status).transpose()?;
    let filter = OrderFilter {
        status,
        medicine_id: query.medicine_id,
    };
    let list = state.pharmacy.ledger.list(filter).await?;
    tracing::debug!(count = list.len(), "listed orders");
    Ok(Json(state.pharmacy.order_views(list).await?))
}

async fn create_order<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let Json(payload) = payload?;
    let order = state
        .pharmacy
        .ledger
        .create(payload.customer_name, payload.medicine_id, payload.quantity)
        .await?;
    let view = state.pharmacy.order_view(order).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_order<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, AppError> {
    let order = state.pharmacy.ledger.get(parse_id(&id)?).await?;
    Ok(Json(state.pharmacy.order_view(order).await?))
}

async fn patch_order<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<OrderPatch>, JsonRejection>,
) -> Result<Json<OrderView>, AppError> {
    let Json(payload) = payload?;
    let order = state
        .pharmacy
        .ledger
        .update(parse_id(&id)?, payload)
        .await?;
    Ok(Json(state.pharmacy.order_view(order).await?))
}

async fn update_status<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let Json(payload) = payload?;
    let order = state
        .pharmacy
        .ledger
        .update_status(parse_id(&id)?, &payload.status)
        .await?;
    Ok(Json(StatusResponse {
        id: order.id,
        status: order.status.to_string(),
    }))
}

async fn delete_order<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.pharmacy.ledger.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
