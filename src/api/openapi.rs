//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, inventory};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rentops Inventory API",
        version = "1.0.0",
        description = "Virtual inventory and overbooking conflict engine for rental operations",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Inventory
        inventory::effective_stock,
        inventory::conflicts,
        inventory::suggestions,
        inventory::availability,
        inventory::overbooked,
        inventory::invalidate,
    ),
    components(
        schemas(
            // Inventory requests
            inventory::EffectiveStockRequest,
            inventory::AvailabilityQuery,
            inventory::AvailabilityResponse,
            inventory::OverbookedQuery,
            inventory::OverbookedResponse,
            inventory::InvalidateRequest,
            crate::models::ConflictFilter,
            crate::models::SuggestionQuery,
            // Inventory results
            crate::models::DateRange,
            crate::models::StockReport,
            crate::models::EffectiveStock,
            crate::models::inventory::StockSource,
            crate::models::inventory::StockSourceKind,
            crate::models::UnknownAvailability,
            crate::models::UnknownCause,
            crate::models::ConflictReport,
            crate::models::ConflictAnalysis,
            crate::models::AffectedBooking,
            crate::models::Severity,
            crate::models::SubrentalSuggestion,
            crate::models::inventory::ProviderSuggestion,
            crate::models::InvalidationScope,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "inventory", description = "Effective stock, conflicts and subrental suggestions")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
