//! Vehicle catalog endpoints under `/api/vehicles`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, VehicleRequest, VehicleSearchQuery};
use crate::AppState;

/// `GET /api/vehicles`, ordered by make then model.
pub async fn list_vehicles(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.vehicles.list().await {
        Ok(vehicles) => HttpResponse::Ok().json(ApiResponse::success(vehicles)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_vehicle(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.vehicles.get(path.into_inner()).await {
        Ok(vehicle) => HttpResponse::Ok().json(ApiResponse::success(vehicle)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/vehicles/make/{make}`
pub async fn vehicles_by_make(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.vehicles.by_make(&path).await {
        Ok(vehicles) => HttpResponse::Ok().json(ApiResponse::success(vehicles)),
        Err(e) => error_response(&e),
    }
}

/// Search make or model.
///
/// ## Endpoint
///
/// `GET /api/vehicles/search?search=hil`
pub async fn search_vehicles(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    query: web::Query<VehicleSearchQuery>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.vehicles.search(query.search.as_deref()).await {
        Ok(vehicles) => HttpResponse::Ok().json(ApiResponse::success(vehicles)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/vehicles/makes`
pub async fn list_makes(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.vehicles.makes().await {
        Ok(makes) => HttpResponse::Ok().json(ApiResponse::success(makes)),
        Err(e) => error_response(&e),
    }
}

/// Add a vehicle to the catalog.
///
/// ## Endpoint
///
/// `POST /api/vehicles`
///
/// ## Request Body
///
/// ```json
/// { "make": "Toyota", "model": "Hilux SR", "year": 2024, "price": "285000.00" }
/// ```
///
/// `price` is accepted as a number or a decimal string. (make, model, year)
/// must be unique.
pub async fn create_vehicle(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<VehicleRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::InventoryOrAdmin) {
        return resp;
    }

    info!(
        "Create vehicle request: {} {} {}",
        body.make.trim(),
        body.model.trim(),
        body.year
    );

    match state.vehicles.create(&body).await {
        Ok(vehicle) => HttpResponse::Created().json(ApiResponse::success(vehicle)),
        Err(e) => error_response(&e),
    }
}

pub async fn update_vehicle(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<VehicleRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::InventoryOrAdmin) {
        return resp;
    }

    match state.vehicles.update(path.into_inner(), &body).await {
        Ok(vehicle) => HttpResponse::Ok().json(ApiResponse::success(vehicle)),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/vehicles/{id}`: refused while an opportunity or quotation item uses it.
pub async fn delete_vehicle(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    match state.vehicles.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("vehicle deleted")),
        Err(e) => error_response(&e),
    }
}
