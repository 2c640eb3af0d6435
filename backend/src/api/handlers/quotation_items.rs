//! Quotation item endpoints under `/api/quotation-items`.
//!
//! Every write answers with the item and the recomputed quotation total:
//!
//! ```json
//! {
//!     "success": true,
//!     "data": {
//!         "item": { "id": 21, "quotationId": 9, "total": 565000000, ... },
//!         "quotationId": 9,
//!         "quotationTotal": 565000000,
//!         "formattedQuotationTotal": "5,650,000.00"
//!     }
//! }
//! ```

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, QuotationItemRequest, UpdateQuotationItemRequest};
use crate::AppState;

pub async fn get_item(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    match state.quotations.get_item(path.into_inner()).await {
        Ok(item) => HttpResponse::Ok().json(ApiResponse::success(item)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/quotation-items/quotation/{quotationId}`
pub async fn items_of_quotation(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    match state.quotations.items_of(path.into_inner()).await {
        Ok(items) => HttpResponse::Ok().json(ApiResponse::success(items)),
        Err(e) => error_response(&e),
    }
}

/// Add an item to an active quotation.
///
/// ## Endpoint
///
/// `POST /api/quotation-items`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/api/quotation-items \
///   -H "Authorization: Bearer $TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "quotationId": 9,
///     "vehicleId": 4,
///     "description": "Hilux SR 2024, white",
///     "quantity": 2,
///     "unitPrice": "285000.00",
///     "discount": "5000.00"
///   }'
/// ```
///
/// ## Errors
///
/// - `VALIDATION_ERROR` - quotation or vehicle not found, bad fields, discount above the amount
/// - `BUSINESS_RULE_VIOLATION` - the quotation is inactive
pub async fn create_item(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<QuotationItemRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    info!(
        "Add item request: quotation {} vehicle {} x{}",
        body.quotation_id, body.vehicle_id, body.quantity
    );

    match state.quotations.add_item(&body).await {
        Ok(result) => HttpResponse::Created().json(ApiResponse::success(result)),
        Err(e) => error_response(&e),
    }
}

pub async fn update_item(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateQuotationItemRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    match state.quotations.update_item(path.into_inner(), &body).await {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(result)),
        Err(e) => error_response(&e),
    }
}

pub async fn delete_item(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    match state.quotations.delete_item(path.into_inner()).await {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success_with_message(
            result,
            "quotation item deleted",
        )),
        Err(e) => error_response(&e),
    }
}
