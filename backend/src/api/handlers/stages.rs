//! Pipeline stage endpoints under `/api/stages`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{ApiResponse, StageRequest};
use crate::AppState;

pub async fn list_stages(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.stages.list().await {
        Ok(stages) => HttpResponse::Ok().json(ApiResponse::success(stages)),
        Err(e) => error_response(&e),
    }
}

pub async fn get_stage(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.stages.get(path.into_inner()).await {
        Ok(stage) => HttpResponse::Ok().json(ApiResponse::success(stage)),
        Err(e) => error_response(&e),
    }
}

pub async fn create_stage(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<StageRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    match state.stages.create(&body).await {
        Ok(stage) => HttpResponse::Created().json(ApiResponse::success(stage)),
        Err(e) => error_response(&e),
    }
}

pub async fn update_stage(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<StageRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    match state.stages.update(path.into_inner(), &body).await {
        Ok(stage) => HttpResponse::Ok().json(ApiResponse::success(stage)),
        Err(e) => error_response(&e),
    }
}

/// Refused while any opportunity sits in the stage.
pub async fn delete_stage(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    match state.stages.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("stage deleted")),
        Err(e) => error_response(&e),
    }
}
