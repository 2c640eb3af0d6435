//! Client endpoints under `/api/clients`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, ClientRequest};
use crate::AppState;

/// Create a client.
///
/// ## Endpoint
///
/// `POST /api/clients`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/api/clients \
///   -H "Authorization: Bearer $TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "name": "Transportes Quetzal",
///     "nit": "1234567-8",
///     "address": "6a Avenida 10-20, Zona 1",
///     "email": "compras@quetzal.com"
///   }'
/// ```
///
/// ## Errors
///
/// - `VALIDATION_ERROR` - missing name, NIT or address, or a bad email
/// - `BUSINESS_RULE_VIOLATION` - a client with this NIT already exists
pub async fn create_client(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<ClientRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    info!("Create client request: NIT {}", body.nit.trim());

    match state.clients.create(&body).await {
        Ok(client) => HttpResponse::Created().json(ApiResponse::success(client)),
        Err(e) => error_response(&e),
    }
}

/// List clients with their pipeline counters.
///
/// ## Endpoint
///
/// `GET /api/clients`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "items": [
///             {
///                 "id": 1,
///                 "name": "Transportes Quetzal",
///                 "nit": "1234567-8",
///                 "address": "6a Avenida 10-20, Zona 1",
///                 "email": null,
///                 "opportunitiesCount": 3,
///                 "activeOpportunitiesCount": 2,
///                 "quotationsCount": 4
///             }
///         ],
///         "total": 1
///     }
/// }
/// ```
pub async fn list_clients(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.clients.list().await {
        Ok(clients) => HttpResponse::Ok().json(ApiResponse::success(clients)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/clients/name/{name}`: case-insensitive substring search, at least 2 characters.
pub async fn search_clients(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.clients.search_by_name(&path).await {
        Ok(clients) => HttpResponse::Ok().json(ApiResponse::success(clients)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/clients/nit/{nit}`
pub async fn get_client_by_nit(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.clients.get_by_nit(&path).await {
        Ok(client) => HttpResponse::Ok().json(ApiResponse::success(client)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/clients/{id}`: counters plus an opportunity summary.
pub async fn get_client(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.clients.get(path.into_inner()).await {
        Ok(client) => HttpResponse::Ok().json(ApiResponse::success(client)),
        Err(e) => error_response(&e),
    }
}

/// Update a client.
///
/// ## Endpoint
///
/// `PUT /api/clients/{id}`
///
/// An `id` in the body, if present, must match the path.
pub async fn update_client(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ClientRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesOrAdmin) {
        return resp;
    }

    match state.clients.update(path.into_inner(), &body).await {
        Ok(client) => HttpResponse::Ok().json(ApiResponse::success(client)),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/clients/{id}`: refused while the client has opportunities.
pub async fn delete_client(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOrManager) {
        return resp;
    }

    let id = path.into_inner();
    info!("Delete client {} requested by {}", id, user.username);

    match state.clients.delete(id).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("client deleted")),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/clients/{id}/opportunities`
pub async fn client_opportunities(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::SalesTeam) {
        return resp;
    }

    match state.clients.opportunities(path.into_inner()).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Err(e) => error_response(&e),
    }
}
