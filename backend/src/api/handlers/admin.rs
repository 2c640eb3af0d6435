//! User administration under `/api/admin`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::ApiResponse;
use crate::AppState;

/// `GET /api/admin/users`
pub async fn list_users(state: web::Data<Arc<AppState>>, user: AuthUser) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    match state.users.list().await {
        Ok(users) => HttpResponse::Ok().json(ApiResponse::success(users)),
        Err(e) => error_response(&e),
    }
}

/// `DELETE /api/admin/users/{id}`
///
/// Admins cannot delete themselves, and users that own opportunities are kept.
pub async fn delete_user(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    match state.users.delete(&user, path.into_inner()).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("user deleted")),
        Err(e) => error_response(&e),
    }
}
