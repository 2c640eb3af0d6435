//! Opportunity endpoints under `/api/opportunities`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, OpportunityRequest, StatusRequest};
use crate::AppState;

/// `GET /api/opportunities`
pub async fn list_opportunities(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.opportunities.list().await {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/opportunities/client/{clientId}`
pub async fn opportunities_by_client(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.opportunities.by_client(path.into_inner()).await {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/opportunities/user/{userId}`
pub async fn opportunities_by_user(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.opportunities.by_user(path.into_inner()).await {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(e) => error_response(&e),
    }
}

/// Full opportunity detail.
///
/// ## Endpoint
///
/// `GET /api/opportunities/{id}`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "id": 5,
///         "active": true,
///         "client": { "id": 1, "name": "Transportes Quetzal", "nit": "1234567-8", ... },
///         "seller": { "id": 3, "firstName": "Ana", "lastName": "Pérez", "email": "ana@example.com" },
///         "vehicle": { "id": 4, "make": "Toyota", "model": "Hilux SR", "year": 2024, ... },
///         "stage": { "id": 2, "name": "Negotiation" },
///         "quotations": [
///             { "id": 9, "active": true, "total": 565000000, "itemsCount": 2, "invoicesCount": 0 }
///         ]
///     }
/// }
/// ```
pub async fn get_opportunity(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.opportunities.get(path.into_inner()).await {
        Ok(detail) => HttpResponse::Ok().json(ApiResponse::success(detail)),
        Err(e) => error_response(&e),
    }
}

/// Open an opportunity. It starts active.
///
/// ## Endpoint
///
/// `POST /api/opportunities`
///
/// ## Request Body
///
/// ```json
/// { "clientId": 1, "userId": 3, "vehicleId": 4, "stageId": 1 }
/// ```
///
/// Each missing reference is reported as `"<x> not found"` with 400.
pub async fn create_opportunity(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<OpportunityRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    info!(
        "Create opportunity request: client {} seller {} by {}",
        body.client_id, body.user_id, user.username
    );

    match state.opportunities.create(&body).await {
        Ok(opportunity) => HttpResponse::Created().json(ApiResponse::success(opportunity)),
        Err(e) => error_response(&e),
    }
}

/// `PUT /api/opportunities/{id}`: replaces every field.
pub async fn update_opportunity(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<OpportunityRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    match state.opportunities.update(path.into_inner(), &body).await {
        Ok(opportunity) => HttpResponse::Ok().json(ApiResponse::success(opportunity)),
        Err(e) => error_response(&e),
    }
}

/// `PUT /api/opportunities/{id}/status`
pub async fn set_opportunity_status(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<StatusRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    match state.opportunities.set_status(path.into_inner(), body.active).await {
        Ok(opportunity) => HttpResponse::Ok().json(ApiResponse::success(opportunity)),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/opportunities/{id}`: refused while it has quotations.
pub async fn delete_opportunity(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOrManager) {
        return resp;
    }

    match state.opportunities.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("opportunity deleted")),
        Err(e) => error_response(&e),
    }
}
