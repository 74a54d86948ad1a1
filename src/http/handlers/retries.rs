use crate::domain::actor::AuthenticatedActor;
use crate::service::retry_service::{ManualRetryRequest, ScheduleRetryRequest};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

pub async fn manual_retry(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(req): Json<ManualRetryRequest>,
) -> impl IntoResponse {
    match state.retry_service.manual_retry(req, &actor).await {
        Ok(outcome) => (axum::http::StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn schedule_retry(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Json(req): Json<ScheduleRetryRequest>,
) -> impl IntoResponse {
    match state.retry_service.schedule_retry(req, &actor).await {
        Ok(schedule) => (axum::http::StatusCode::OK, Json(schedule)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn retry_status(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.retry_service.retry_status(payment_id).await {
        Ok(view) => (axum::http::StatusCode::OK, Json(view)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub payment_id: Option<Uuid>,
}

pub async fn retry_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> impl IntoResponse {
    match state.retry_service.analytics(query.payment_id).await {
        Ok(snapshot) => (axum::http::StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn cancel_retry(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(retry_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.retry_service.cancel(retry_id, &actor).await {
        Ok(attempt) => (axum::http::StatusCode::OK, Json(attempt)).into_response(),
        Err(e) => e.into_response(),
    }
}
