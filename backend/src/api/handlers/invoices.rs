//! Invoice endpoints under `/api/invoices`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, InvoiceRequest};
use crate::AppState;

/// List invoices, newest first.
///
/// ## Endpoint
///
/// `GET /api/invoices`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "items": [
///             {
///                 "id": 3,
///                 "number": "FACT-20250115-3FA9C2",
///                 "status": "pending",
///                 "total": 565000000,
///                 "formattedTotal": "5,650,000.00",
///                 "client": { "id": 1, "name": "Transportes Quetzal", "nit": "1234567-8" },
///                 "seller": { "id": 3, "firstName": "Ana", "lastName": "Pérez" }
///             }
///         ],
///         "total": 1,
///         "totalIssued": 0,
///         "totalPending": 1
///     }
/// }
/// ```
pub async fn list_invoices(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::BackOffice) {
        return resp;
    }

    match state.invoices.list().await {
        Ok(invoices) => HttpResponse::Ok().json(ApiResponse::success(invoices)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/invoices/{id}`: client, seller, vehicle, quotation and items.
pub async fn get_invoice(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::BackOffice) {
        return resp;
    }

    match state.invoices.get(path.into_inner()).await {
        Ok(invoice) => HttpResponse::Ok().json(ApiResponse::success(invoice)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/invoices/client/{clientId}`
pub async fn invoices_by_client(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::BackOffice) {
        return resp;
    }

    match state.invoices.by_client(path.into_inner()).await {
        Ok(invoices) => HttpResponse::Ok().json(ApiResponse::success(invoices)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/invoices/pending`, oldest first.
pub async fn pending_invoices(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOrManager) {
        return resp;
    }

    match state.invoices.pending().await {
        Ok(invoices) => HttpResponse::Ok().json(ApiResponse::success(invoices)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/invoices/quotation/{quotationId}`
pub async fn invoice_by_quotation(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::BackOffice) {
        return resp;
    }

    match state.invoices.by_quotation(path.into_inner()).await {
        Ok(invoice) => HttpResponse::Ok().json(ApiResponse::success(invoice)),
        Err(e) => error_response(&e),
    }
}

/// Invoice an active quotation.
///
/// ## Endpoint
///
/// `POST /api/invoices`
///
/// ## Request Body
///
/// ```json
/// { "quotationId": 9 }
/// ```
///
/// The invoice starts `pending` with the quotation's total.
pub async fn create_invoice(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<InvoiceRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOrManager) {
        return resp;
    }

    info!("Create invoice request for quotation {} by {}", body.quotation_id, user.username);

    match state.invoices.create(body.quotation_id).await {
        Ok(invoice) => HttpResponse::Created().json(ApiResponse::success(invoice)),
        Err(e) => error_response(&e),
    }
}

/// `PUT /api/invoices/{id}/issue`
pub async fn issue_invoice(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOrManager) {
        return resp;
    }

    match state.invoices.issue(path.into_inner()).await {
        Ok(invoice) => HttpResponse::Ok().json(ApiResponse::success(invoice)),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/invoices/{id}`: pending invoices only.
pub async fn delete_invoice(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    match state.invoices.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("invoice deleted")),
        Err(e) => error_response(&e),
    }
}
