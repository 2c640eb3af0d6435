//! Registration, login and password endpoints under `/api/auth`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use tracing::info;

use super::{authorize, error_response};
use crate::auth::{AuthUser, Policy};
use crate::models::{
    ApiResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};
use crate::AppState;

/// Register a user (admin only).
///
/// ## Endpoint
///
/// `POST /api/auth/register`
///
/// ## Request Body
///
/// ```json
/// {
///     "userName": "mlopez",
///     "email": "mlopez@example.com",
///     "firstName": "María",
///     "lastName": "López",
///     "password": "Secret1",
///     "role": "gerente"
/// }
/// ```
///
/// `role` is optional and defaults to `vendedor`.
pub async fn register(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<RegisterRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    info!("Register request for {} by {}", body.user_name.trim(), user.username);

    match state.users.register(&body).await {
        Ok(created) => HttpResponse::Created().json(ApiResponse::success_with_message(
            created,
            "user registered",
        )),
        Err(e) => error_response(&e),
    }
}

/// Exchange credentials for a bearer token.
///
/// ## Endpoint
///
/// `POST /api/auth/login`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/api/auth/login \
///   -H "Content-Type: application/json" \
///   -d '{"userName": "admin", "password": "Admin123"}'
/// ```
///
/// Wrong username or password both answer 401 with the same message.
pub async fn login(
    state: web::Data<Arc<AppState>>,
    body: web::Json<LoginRequest>,
) -> HttpResponse {
    match state.users.login(&body).await {
        Ok(session) => HttpResponse::Ok().json(ApiResponse::success(session)),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/auth/change-password`
pub async fn change_password(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::Authenticated) {
        return resp;
    }

    match state.users.change_password(user.id, &body).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("password changed")),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/auth/reset-password/{userId}` (admin only)
pub async fn reset_password(
    state: web::Data<Arc<AppState>>,
    user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ResetPasswordRequest>,
) -> HttpResponse {
    if let Err(resp) = authorize(&user, Policy::AdminOnly) {
        return resp;
    }

    let user_id = path.into_inner();
    info!("Password reset for user {} by {}", user_id, user.username);

    match state.users.reset_password(user_id, &body).await {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::<()>::message("password reset")),
        Err(e) => error_response(&e),
    }
}
