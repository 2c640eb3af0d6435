//! # API Request Handlers
//!
//! One module per resource. Each handler:
//! 1. Extracts the caller (`AuthUser`) and request data
//! 2. Checks the endpoint's role policy
//! 3. Calls the resource's manager
//! 4. Returns a formatted response
//!
//! ## Error Handling
//!
//! Every `CrmError` is returned as JSON with its status and code:
//!
//! ```json
//! {
//!     "success": false,
//!     "data": null,
//!     "message": null,
//!     "error": {
//!         "code": "BUSINESS_RULE_VIOLATION",
//!         "message": "cannot delete a client that has opportunities"
//!     }
//! }
//! ```

pub mod admin;
pub mod auth;
pub mod clients;
pub mod invoices;
pub mod opportunities;
pub mod products;
pub mod quotation_items;
pub mod quotations;
pub mod sales;
pub mod stages;
pub mod vehicles;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, HealthResponse};
use crate::services::CrmError;
use crate::AppState;

/// Render a service error as the JSON envelope.
pub(crate) fn error_response(e: &CrmError) -> HttpResponse {
    HttpResponse::build(e.status()).json(ApiResponse::<()>::error(e.code(), &e.public_message()))
}

/// Check the caller against `policy`, producing the 403 response on failure.
pub(crate) fn authorize(user: &AuthUser, policy: Policy) -> Result<(), HttpResponse> {
    user.authorize(policy)
        .map_err(|e| error_response(&CrmError::from(e)))
}

/// API information endpoint (root).
///
/// ## Endpoint
///
/// `GET /`
pub async fn api_info() -> HttpResponse {
    let info = json!({
        "name": "Vehicle Sales CRM API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Clients, vehicles, sales pipeline, quotations, invoices and direct sales",
        "authentication": "Authorization: Bearer <token from POST /api/auth/login>",
        "endpoints": {
            "health": "/healthz",
            "auth": "/api/auth",
            "admin": "/api/admin/users",
            "clients": "/api/clients",
            "vehicles": "/api/vehicles",
            "stages": "/api/stages",
            "opportunities": "/api/opportunities",
            "quotations": "/api/quotations",
            "quotationItems": "/api/quotation-items",
            "invoices": "/api/invoices",
            "products": "/api/products",
            "sales": "/api/sales"
        }
    });

    HttpResponse::Ok().json(ApiResponse::success(info))
}

/// Health check endpoint.
///
/// ## Endpoint
///
/// `GET /healthz`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "status": "healthy",
///         "database": true,
///         "version": "0.1.0",
///         "timestamp": "2025-01-15T12:00:00Z"
///     }
/// }
/// ```
///
/// Answers 503 with `"status": "unhealthy"` when the database cannot be reached.
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let db_healthy = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: database unreachable: {}", e);
            false
        }
    };

    let response = HealthResponse {
        status: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
        database: db_healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    HttpResponse::build(status_code).json(ApiResponse::success(response))
}
