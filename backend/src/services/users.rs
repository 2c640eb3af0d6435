//! # User Manager
//!
//! Accounts, login and password management.
//!
//! ## Login Flow
//!
//! ```text
//! {userName, password}
//!        │
//!        ▼
//!   lookup by username ── none ──────────┐
//!        │                               ├──► 401 "invalid username or password"
//!        ▼                               │
//!   bcrypt verify ───── mismatch ────────┘
//!        │
//!        ▼
//!   Claims::for_user ──► HS256 token ──► {token, expiresAt, user}
//! ```

use chrono::DateTime;
use tracing::{info, warn};

use crate::auth::{
    hash_password, issue_token, validate_password_policy, verify_password, AuthError, AuthUser,
    Claims, Role,
};
use crate::config::{AppConfig, BootstrapAdmin};
use crate::db::queries::{opportunities, users};
use crate::db::{Database, NewUser};
use crate::models::{
    ChangePasswordRequest, ListResponse, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest, UserResponse,
};
use crate::utils::require_text;

use super::error::{blocked_on_reference, rejected_on_unique};
use super::CrmError;

const MAX_USERNAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 255;
const MAX_NAME_LEN: usize = 100;

/// Validated registration fields, before the password is hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Check a registration request. The role defaults to `vendedor`.
pub fn validate_registration(req: &RegisterRequest) -> Result<Registration, CrmError> {
    let mut problems = Vec::new();

    let username = require_text(&mut problems, "userName", &req.user_name, Some(MAX_USERNAME_LEN));
    let email = require_text(&mut problems, "email", &req.email, Some(MAX_EMAIL_LEN));
    if !email.is_empty() && !email.contains('@') {
        problems.push("email is not a valid address".to_string());
    }
    let first_name = require_text(&mut problems, "firstName", &req.first_name, Some(MAX_NAME_LEN));
    let last_name = require_text(&mut problems, "lastName", &req.last_name, Some(MAX_NAME_LEN));

    if let Err(policy) = validate_password_policy(&req.password) {
        problems.extend(policy);
    }

    let role = match req.role.as_deref().filter(|r| !r.trim().is_empty()) {
        None => Role::Vendedor,
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                problems.push(e);
                Role::Vendedor
            }
        },
    };

    if !problems.is_empty() {
        return Err(CrmError::Validation(problems));
    }

    Ok(Registration {
        username,
        email,
        first_name,
        last_name,
        role,
    })
}

/// A new password must satisfy the policy and match its confirmation.
pub fn validate_new_password(new_password: &str, confirmation: &str) -> Result<(), CrmError> {
    let mut problems = validate_password_policy(new_password).err().unwrap_or_default();
    if new_password != confirmation {
        problems.push("new password and confirmation do not match".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CrmError::Validation(problems))
    }
}

#[derive(Clone)]
pub struct UserManager {
    db: Database,
    config: AppConfig,
}

impl UserManager {
    pub fn new(db: Database, config: AppConfig) -> Self {
        Self { db, config }
    }

    /// Create an account with a single role.
    pub async fn register(&self, req: &RegisterRequest) -> Result<UserResponse, CrmError> {
        let registration = validate_registration(req)?;

        if users::get_user_by_username(self.db.pool(), &registration.username)
            .await?
            .is_some()
        {
            return Err(username_taken());
        }

        let password_hash = hash_password(&req.password).await?;

        let user = users::insert_user(
            self.db.pool(),
            &NewUser {
                username: registration.username,
                email: registration.email,
                first_name: registration.first_name,
                last_name: registration.last_name,
                password_hash,
                role: registration.role.to_string(),
            },
        )
        .await
        .map_err(|e| rejected_on_unique(e, "username is already taken"))?;

        Ok(UserResponse::from(&user))
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, CrmError> {
        let user = match users::get_user_by_username(self.db.pool(), req.user_name.trim()).await? {
            Some(user) => user,
            None => {
                warn!("Login failed: unknown user {}", req.user_name.trim());
                return Err(invalid_credentials());
            }
        };

        if !verify_password(&req.password, &user.password_hash).await? {
            warn!("Login failed: wrong password for {}", user.username);
            return Err(invalid_credentials());
        }

        let claims = Claims::for_user(&user, &self.config);
        let token = issue_token(&claims, &self.config.jwt_secret)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| CrmError::Internal(format!("bad token expiry {}", claims.exp)))?;

        info!("User {} logged in", user.username);

        Ok(LoginResponse {
            token,
            expires_at,
            user: UserResponse::from(&user),
        })
    }

    /// Change the caller's own password.
    pub async fn change_password(
        &self,
        user_id: i32,
        req: &ChangePasswordRequest,
    ) -> Result<(), CrmError> {
        let user = users::get_user(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| CrmError::Unauthorized("the account no longer exists".to_string()))?;

        if !verify_password(&req.current_password, &user.password_hash).await? {
            return Err(CrmError::invalid("current password is incorrect"));
        }

        validate_new_password(&req.new_password, &req.confirm_new_password)?;

        self.store_password(user_id, &req.new_password).await?;

        info!("User {} changed their password", user.username);
        Ok(())
    }

    /// Admin reset of another user's password.
    pub async fn reset_password(
        &self,
        user_id: i32,
        req: &ResetPasswordRequest,
    ) -> Result<(), CrmError> {
        let user = users::get_user(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;

        validate_new_password(&req.new_password, &req.confirm_new_password)?;

        self.store_password(user_id, &req.new_password).await?;

        info!("Password reset for user {}", user.username);
        Ok(())
    }

    pub async fn list(&self) -> Result<ListResponse<UserResponse>, CrmError> {
        let rows = users::list_users(self.db.pool()).await?;
        Ok(ListResponse::new(rows.iter().map(UserResponse::from).collect()))
    }

    pub async fn delete(&self, caller: &AuthUser, id: i32) -> Result<(), CrmError> {
        if caller.id == id {
            return Err(CrmError::BusinessRule(
                "you cannot delete your own account".to_string(),
            ));
        }

        let user = users::get_user(self.db.pool(), id)
            .await?
            .ok_or_else(|| user_not_found(id))?;

        if opportunities::user_has_opportunities(self.db.pool(), id).await? {
            warn!("Refusing to delete user {} with opportunities", user.username);
            return Err(CrmError::BusinessRule(
                "cannot delete a user that owns opportunities".to_string(),
            ));
        }

        let deleted = users::delete_user(self.db.pool(), id)
            .await
            .map_err(|e| blocked_on_reference(e, "cannot delete a user that owns opportunities"))?;
        if !deleted {
            return Err(user_not_found(id));
        }

        info!("User {} deleted by {}", user.username, caller.username);
        Ok(())
    }

    /// Create the configured administrator when nobody holds the admin role.
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), CrmError> {
        if users::role_has_members(self.db.pool(), Role::Admin.as_str()).await? {
            info!("Admin account present, skipping bootstrap");
            return Ok(());
        }

        let email = if admin.email.is_empty() {
            format!("{}@localhost", admin.username)
        } else {
            admin.email.clone()
        };

        let user = self
            .register(&RegisterRequest {
                user_name: admin.username.clone(),
                email,
                first_name: "System".to_string(),
                last_name: "Administrator".to_string(),
                password: admin.password.clone(),
                role: Some(Role::Admin.to_string()),
            })
            .await?;

        info!("Bootstrap admin {} created (id {})", user.user_name, user.id);
        Ok(())
    }

    async fn store_password(&self, user_id: i32, password: &str) -> Result<(), CrmError> {
        let hash = hash_password(password).await?;
        if !users::update_password_hash(self.db.pool(), user_id, &hash).await? {
            return Err(user_not_found(user_id));
        }
        Ok(())
    }
}

fn invalid_credentials() -> CrmError {
    CrmError::from(AuthError::InvalidCredentials)
}

fn username_taken() -> CrmError {
    CrmError::BusinessRule("username is already taken".to_string())
}

fn user_not_found(id: i32) -> CrmError {
    CrmError::NotFound(format!("user {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            user_name: " mlopez ".into(),
            email: "mlopez@example.com".into(),
            first_name: "María".into(),
            last_name: "López".into(),
            password: "Secret1".into(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_registration_defaults_to_vendedor() {
        let reg = validate_registration(&registration(None)).unwrap();
        assert_eq!(reg.username, "mlopez");
        assert_eq!(reg.role, Role::Vendedor);

        let reg = validate_registration(&registration(Some("  "))).unwrap();
        assert_eq!(reg.role, Role::Vendedor);
    }

    #[test]
    fn test_registration_role_is_case_insensitive() {
        let reg = validate_registration(&registration(Some("Inventario"))).unwrap();
        assert_eq!(reg.role, Role::Inventario);
    }

    #[test]
    fn test_registration_reports_every_problem() {
        let req = RegisterRequest {
            user_name: "".into(),
            email: "not-an-email".into(),
            first_name: "Ana".into(),
            last_name: "".into(),
            password: "abc".into(),
            role: Some("cajero".into()),
        };
        match validate_registration(&req) {
            Err(CrmError::Validation(problems)) => {
                assert!(problems.iter().any(|p| p.contains("userName")));
                assert!(problems.iter().any(|p| p.contains("email")));
                assert!(problems.iter().any(|p| p.contains("lastName")));
                assert!(problems.iter().any(|p| p.contains("digit")));
                assert!(problems.iter().any(|p| p.contains("unknown role")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_password_must_match_confirmation() {
        assert!(validate_new_password("Secret1", "Secret1").is_ok());

        match validate_new_password("Secret1", "Secret2") {
            Err(CrmError::Validation(problems)) => {
                assert_eq!(problems, vec!["new password and confirmation do not match"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        match validate_new_password("secret", "secret") {
            Err(CrmError::Validation(problems)) => assert_eq!(problems.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
