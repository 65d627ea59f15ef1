//! Inventory API endpoints

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        ConflictFilter, ConflictReport, DateRange, InvalidationScope, StockReport,
        SubrentalSuggestion, SuggestionQuery,
    },
    services::inventory::InventoryEngine,
    AppState,
};

/// Engine honouring a per-request timeout override
fn engine_for(state: &AppState, timeout_ms: Option<u64>) -> InventoryEngine {
    let engine = &state.services.inventory;
    match timeout_ms {
        Some(ms) => engine.with_timeout(Duration::from_millis(ms)),
        None => engine.clone(),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EffectiveStockRequest {
    #[validate(length(min = 1, max = 1000))]
    pub equipment_ids: Vec<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Overrides the configured computation timeout
    #[validate(range(min = 1, max = 600000))]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub equipment_id: Uuid,
    pub date: NaiveDate,
    /// max(0, effective stock - units booked)
    pub available: i64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct OverbookedQuery {
    pub date: NaiveDate,
    /// Units the caller intends to book in addition to existing bookings
    #[serde(default)]
    pub additional_usage: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverbookedResponse {
    pub equipment_id: Uuid,
    pub date: NaiveDate,
    pub additional_usage: i64,
    pub overbooked: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvalidateRequest {
    pub scope: InvalidationScope,
    pub equipment_id: Option<Uuid>,
}

/// Effective stock per equipment and date
#[utoipa::path(
    post,
    path = "/inventory/effective-stock",
    tag = "inventory",
    request_body = EffectiveStockRequest,
    responses(
        (status = 200, description = "Effective stock, with pairs of unknown availability listed separately", body = StockReport),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 504, description = "Computation timed out", body = crate::error::ErrorResponse)
    )
)]
pub async fn effective_stock(
    State(state): State<AppState>,
    Json(request): Json<EffectiveStockRequest>,
) -> AppResult<Json<StockReport>> {
    request.validate()?;
    let range = DateRange::new(request.start_date, request.end_date)?;
    let report = engine_for(&state, request.timeout_ms)
        .effective_stock(&request.equipment_ids, range)
        .await?;
    Ok(Json(report))
}

/// Overbooking conflicts matching a filter
#[utoipa::path(
    post,
    path = "/inventory/conflicts",
    tag = "inventory",
    request_body = ConflictFilter,
    responses(
        (status = 200, description = "Conflicts in discovery order", body = ConflictReport),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse),
        (status = 503, description = "Bookings could not be read", body = crate::error::ErrorResponse),
        (status = 504, description = "Computation timed out", body = crate::error::ErrorResponse)
    )
)]
pub async fn conflicts(
    State(state): State<AppState>,
    Json(filter): Json<ConflictFilter>,
) -> AppResult<Json<ConflictReport>> {
    let engine = engine_for(&state, filter.timeout_ms);
    let report = engine.conflicts(filter).await?;
    Ok(Json(report))
}

/// Subrental suggestions for the actionable conflicts of a date window
#[utoipa::path(
    get,
    path = "/inventory/suggestions",
    tag = "inventory",
    params(SuggestionQuery),
    responses(
        (status = 200, description = "Suggestions with ranked providers", body = Vec<SubrentalSuggestion>),
        (status = 400, description = "Invalid window", body = crate::error::ErrorResponse),
        (status = 503, description = "Upstream data unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> AppResult<Json<Vec<SubrentalSuggestion>>> {
    let window = query.window()?;
    let suggestions = engine_for(&state, query.timeout_ms)
        .subrental_suggestions(window)
        .await?;
    Ok(Json(suggestions))
}

/// Units of an equipment still free on a date
#[utoipa::path(
    get,
    path = "/inventory/equipment/{id}/availability",
    tag = "inventory",
    params(
        ("id" = Uuid, Path, description = "Equipment ID"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Available units", body = AvailabilityResponse),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse),
        (status = 503, description = "Availability unknown", body = crate::error::ErrorResponse)
    )
)]
pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AvailabilityResponse>> {
    let available = state.services.inventory.availability(id, query.date).await?;
    Ok(Json(AvailabilityResponse {
        equipment_id: id,
        date: query.date,
        available,
    }))
}

/// Whether additional usage would overbook an equipment on a date
#[utoipa::path(
    get,
    path = "/inventory/equipment/{id}/overbooked",
    tag = "inventory",
    params(
        ("id" = Uuid, Path, description = "Equipment ID"),
        OverbookedQuery
    ),
    responses(
        (status = 200, description = "Overbooking verdict", body = OverbookedResponse),
        (status = 400, description = "Negative additional usage", body = crate::error::ErrorResponse),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse),
        (status = 503, description = "Availability unknown", body = crate::error::ErrorResponse)
    )
)]
pub async fn overbooked(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<OverbookedQuery>,
) -> AppResult<Json<OverbookedResponse>> {
    let overbooked = state
        .services
        .inventory
        .is_overbooked(id, query.date, query.additional_usage)
        .await?;
    Ok(Json(OverbookedResponse {
        equipment_id: id,
        date: query.date,
        additional_usage: query.additional_usage,
        overbooked,
    }))
}

/// Drop derived results after an upstream write
#[utoipa::path(
    post,
    path = "/inventory/invalidate",
    tag = "inventory",
    request_body = InvalidateRequest,
    responses(
        (status = 204, description = "Derived results cleared")
    )
)]
pub async fn invalidate(
    State(state): State<AppState>,
    Json(request): Json<InvalidateRequest>,
) -> AppResult<StatusCode> {
    state
        .services
        .inventory
        .invalidate(request.scope, request.equipment_id)
        .await;
    Ok(StatusCode::NO_CONTENT)
}
