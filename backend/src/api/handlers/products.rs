//! Product endpoints under `/api/products`, addressed by name.

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, ProductRequest};
use crate::AppState;

pub async fn list_products(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.products.list().await {
        Ok(products) => HttpResponse::Ok().json(ApiResponse::success(products)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_product(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.products.get(&path).await {
        Ok(product) => HttpResponse::Ok().json(ApiResponse::success(product)),
        Err(e) => error_response(&e),
    }
}

pub async fn create_product(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<ProductRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::InventoryOrAdmin) {
        return resp;
    }

    match state.products.create(&body).await {
        Ok(product) => HttpResponse::Created().json(ApiResponse::success(product)),
        Err(e) => error_response(&e),
    }
}

/// `PUT /api/products/{name}`: 204 on success.
pub async fn update_product(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<ProductRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::InventoryOrAdmin) {
        return resp;
    }

    match state.products.update(&path, &body).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/products/{name}`: 204 on success.
pub async fn delete_product(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::InventoryOrAdmin) {
        return resp;
    }

    match state.products.delete(&path).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}
