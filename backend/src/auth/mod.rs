//! # Authentication and Authorization
//!
//! Identity for the CRM API:
//!
//! - **Roles** a user can hold (`admin`, `gerente`, `vendedor`, `asistente`, `inventario`)
//! - **Policies**, the role sets each endpoint accepts
//! - **Tokens**, HS256 JWTs issued at login (see [`token`])
//! - **Passwords**, bcrypt hashes plus the password policy (see [`password`])
//! - **[`AuthUser`]**, an actix extractor that turns a bearer token into a caller
//!
//! ## Request Flow
//!
//! ```text
//! Authorization: Bearer <jwt>
//!          │
//!          ▼
//!   AuthUser::from_request ──── missing / bad token ──► 401 UNAUTHORIZED
//!          │
//!          ▼
//!   user.authorize(Policy::X) ── role not in policy ──► 403 FORBIDDEN
//!          │
//!          ▼
//!       handler
//! ```

pub mod password;
pub mod token;

use std::fmt;
use std::future::{ready, Ready};
use std::str::FromStr;
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::http::{header, StatusCode};
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;
use tracing::warn;

use crate::models::ApiResponse;
use crate::AppState;

pub use password::{hash_password, validate_password_policy, verify_password};
pub use token::{issue_token, verify_token, Claims};

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("token signing failed: {0}")]
    Token(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Token(_) | AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = match self.status_code() {
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            _ => "INTERNAL_ERROR",
        };
        HttpResponse::build(self.status_code())
            .json(ApiResponse::<()>::error(code, &self.to_string()))
    }
}

// ============================================
// ROLES AND POLICIES
// ============================================

/// A role a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Full access.
    Admin,
    /// Manager: sales and reports.
    Gerente,
    /// Salesperson: opportunities and quotations.
    Vendedor,
    /// Assistant: read and support.
    Asistente,
    /// Inventory: vehicles and products.
    Inventario,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Gerente,
        Role::Vendedor,
        Role::Asistente,
        Role::Inventario,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Gerente => "gerente",
            Role::Vendedor => "vendedor",
            Role::Asistente => "asistente",
            Role::Inventario => "inventario",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| format!("unknown role: {}", s.trim()))
    }
}

/// The role sets endpoints are guarded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Authenticated,
    AdminOnly,
    SalesOrAdmin,
    AdminOrManager,
    SalesTeam,
    InventoryOrAdmin,
    BackOffice,
}

impl Policy {
    /// Roles accepted by the policy. `Authenticated` accepts every role.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Policy::Authenticated => &Role::ALL,
            Policy::AdminOnly => &[Role::Admin],
            Policy::SalesOrAdmin => &[Role::Admin, Role::Vendedor],
            Policy::AdminOrManager => &[Role::Admin, Role::Gerente],
            Policy::SalesTeam => &[Role::Admin, Role::Gerente, Role::Vendedor],
            Policy::InventoryOrAdmin => &[Role::Admin, Role::Inventario],
            Policy::BackOffice => &[Role::Admin, Role::Asistente, Role::Inventario],
        }
    }

    /// Whether any of `roles` satisfies the policy. Unknown role names are ignored.
    pub fn allows(&self, roles: &[String]) -> bool {
        roles
            .iter()
            .filter_map(|r| r.parse::<Role>().ok())
            .any(|r| self.roles().contains(&r))
    }
}

// ============================================
// EXTRACTOR
// ============================================

/// The caller behind a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    /// Fail with 403 unless the caller's roles satisfy `policy`.
    pub fn authorize(&self, policy: Policy) -> Result<(), AuthError> {
        if policy.allows(&self.roles) {
            Ok(())
        } else {
            warn!("User {} denied by policy {:?}", self.username, policy);
            Err(AuthError::Forbidden(format!(
                "this action requires one of the roles: {}",
                policy
                    .roles()
                    .iter()
                    .map(Role::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    fn from_claims(claims: Claims) -> Result<Self, AuthError> {
        Ok(Self {
            id: claims.user_id()?,
            username: claims.unique_name,
            roles: claims.roles,
        })
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AuthError> {
    let state = req
        .app_data::<web::Data<Arc<AppState>>>()
        .ok_or_else(|| AuthError::Token("application state not configured".to_string()))?;

    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
    let claims = verify_token(token, &state.config)?;

    AuthUser::from_claims(claims)
}

impl FromRequest for AuthUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(" Gerente ".parse::<Role>(), Ok(Role::Gerente));
        assert_eq!("INVENTARIO".parse::<Role>(), Ok(Role::Inventario));
        assert!("cajero".parse::<Role>().is_err());
    }

    #[test]
    fn test_policy_role_sets() {
        assert!(Policy::Authenticated.allows(&roles(&["asistente"])));
        assert!(!Policy::AdminOnly.allows(&roles(&["gerente"])));
        assert!(Policy::SalesOrAdmin.allows(&roles(&["vendedor"])));
        assert!(!Policy::SalesOrAdmin.allows(&roles(&["gerente"])));
        assert!(Policy::SalesTeam.allows(&roles(&["gerente"])));
        assert!(!Policy::SalesTeam.allows(&roles(&["asistente"])));
        assert!(Policy::InventoryOrAdmin.allows(&roles(&["inventario"])));
        assert!(Policy::BackOffice.allows(&roles(&["asistente"])));
        assert!(!Policy::BackOffice.allows(&roles(&["vendedor"])));
        assert!(!Policy::BackOffice.allows(&roles(&["gerente"])));
        assert!(Policy::BackOffice.allows(&roles(&["gerente", "inventario"])));
    }

    #[test]
    fn test_any_matching_role_is_enough() {
        assert!(Policy::AdminOnly.allows(&roles(&["vendedor", "admin"])));
        assert!(!Policy::Authenticated.allows(&roles(&["unknown"])));
        assert!(!Policy::Authenticated.allows(&[]));
    }

    #[test]
    fn test_authorize_maps_to_forbidden() {
        let user = AuthUser {
            id: 3,
            username: "vendedor1".to_string(),
            roles: roles(&["vendedor"]),
        };
        assert!(user.authorize(Policy::SalesOrAdmin).is_ok());
        let err = user.authorize(Policy::AdminOrManager).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("admin, gerente"));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let req = actix_web::test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));

        let req = actix_web::test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = actix_web::test::TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
