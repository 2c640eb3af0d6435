//! Direct sale endpoints under `/api/sales`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, SaleRequest};
use crate::AppState;

/// Record a direct sale.
///
/// ## Endpoint
///
/// `POST /api/sales`
///
/// ## Request Body
///
/// ```json
/// {
///     "clientId": 1,
///     "vehicles": [
///         { "vehicleId": 4, "quantity": 2 },
///         { "vehicleId": 7, "quantity": 1 }
///     ]
/// }
/// ```
///
/// Unit prices are taken from the catalog, not from the request.
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "id": 12,
///         "date": "2025-01-15 14:03:22",
///         "client": { "id": 1, "name": "Transportes Quetzal", ... },
///         "lines": [
///             { "vehicleId": 4, "make": "Toyota", "model": "Hilux SR", "year": 2024,
///               "quantity": 2, "unitPrice": 28500000, "subtotal": 57000000 }
///         ],
///         "total": 57000000,
///         "formattedTotal": "570,000.00"
///     }
/// }
/// ```
pub async fn create_sale(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<SaleRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    info!(
        "Sale request: client {} with {} line(s) by {}",
        body.client_id,
        body.vehicles.len(),
        user.username
    );

    match state.sales.create(&body).await {
        Ok(sale) => HttpResponse::Created().json(ApiResponse::success(sale)),
        Err(e) => error_response(&e),
    }
}

pub async fn list_sales(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.sales.list().await {
        Ok(sales) => HttpResponse::Ok().json(ApiResponse::success(sales)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_sale(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.sales.get(path.into_inner()).await {
        Ok(sale) => HttpResponse::Ok().json(ApiResponse::success(sale)),
        Err(e) => error_response(&e),
    }
}
