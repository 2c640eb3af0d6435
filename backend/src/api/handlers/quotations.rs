//! Quotation endpoints under `/api/quotations`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, QuotationRequest, StatusRequest};
use crate::AppState;

pub async fn list_quotations(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.quotations.list().await {
        Ok(quotations) => HttpResponse::Ok().json(ApiResponse::success(quotations)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/quotations/{id}`, with its items.
pub async fn get_quotation(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.quotations.get(path.into_inner()).await {
        Ok(quotation) => HttpResponse::Ok().json(ApiResponse::success(quotation)),
        Err(e) => error_response(&e),
    }
}

/// Open a quotation for an opportunity.
///
/// ## Endpoint
///
/// `POST /api/quotations`
///
/// ## Request Body
///
/// ```json
/// { "opportunityId": 5, "active": true }
/// ```
///
/// The total starts at zero and follows the items from then on.
///
/// ## Errors
///
/// - `VALIDATION_ERROR` - opportunity not found
/// - `BUSINESS_RULE_VIOLATION` - the opportunity already has an active quotation
pub async fn create_quotation(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<QuotationRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    info!("Create quotation request for opportunity {}", body.opportunity_id);

    match state.quotations.create(&body).await {
        Ok(quotation) => HttpResponse::Created().json(ApiResponse::success(quotation)),
        Err(e) => error_response(&e),
    }
}

/// `PUT /api/quotations/{id}/status`
pub async fn set_quotation_status(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<StatusRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    match state.quotations.set_status(path.into_inner(), body.active).await {
        Ok(quotation) => HttpResponse::Ok().json(ApiResponse::success(quotation)),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/quotations/{id}`: refused once invoiced. Items go with it.
pub async fn delete_quotation(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOrManager) {
        return resp;
    }

    match state.quotations.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("quotation deleted")),
        Err(e) => error_response(&e),
    }
}
