/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get a session token
/// - `POST /v1/auth/logout` - End the session (client discards the token)
/// - `GET  /v1/auth/verify` - Return the authenticated user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{jwt, password},
    models::{CreateUser, User},
    org::{Role, Team},
    policy::Principal,
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (validated for length separately)
    pub password: String,

    /// Job title
    #[serde(default)]
    pub title: String,

    pub role: Role,

    pub team: Option<Team>,

    pub manager_id: Option<Uuid>,

    #[serde(default)]
    pub is_admin: bool,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,

    /// Session token (30d)
    pub token: String,
}

/// Collects the role-conditional field errors for a registration
///
/// A team is required for every role except sub_admin; a manager is
/// required for team leads and members. All failures are reported in one
/// response rather than one at a time.
fn role_field_errors(
    role: Role,
    team: Option<Team>,
    manager_id: Option<Uuid>,
) -> Vec<ValidationErrorDetail> {
    let mut errors = Vec::new();

    if role.requires_team() && team.is_none() {
        errors.push(ValidationErrorDetail {
            field: "team".to_string(),
            message: "A team is required for this role".to_string(),
        });
    }
    if role.requires_manager() && manager_id.is_none() {
        errors.push(ValidationErrorDetail {
            field: "manager_id".to_string(),
            message: "A manager is required for this role".to_string(),
        });
    }

    errors
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Carol",
///   "email": "carol@example.com",
///   "password": "SecureP@ss123",
///   "title": "Frontend Lead",
///   "role": "team_lead",
///   "team": "Development",
///   "manager_id": "uuid"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed (all field errors listed)
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(axum::http::StatusCode, Json<User>)> {
    req.validate()?;
    password::validate_password_strength(&req.password)?;

    let field_errors = role_field_errors(req.role, req.team, req.manager_id);
    if !field_errors.is_empty() {
        return Err(ApiError::ValidationError(field_errors));
    }

    if User::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::Conflict("Email address already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            title: req.title,
            role: req.role,
            team: req.team,
            manager_id: req.manager_id,
            is_admin: req.is_admin,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok((axum::http::StatusCode::CREATED, Json(user)))
}

/// Login and receive a session token
///
/// A wrong email and a wrong password produce the same 401, so the
/// endpoint does not confirm which addresses are registered. Deactivated
/// accounts are told so explicitly.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized(
            "User account has been deactivated, contact the administrator".to_string(),
        ));
    }

    if !password::verify_password(&req.password, &user.password_hash)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = jwt::create_token(user.id, state.jwt_secret())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse { user, token }))
}

/// Logout
///
/// Tokens are stateless; the server acknowledges and the client discards
/// its copy.
pub async fn logout() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Logged out successfully" }))
}

/// Return the authenticated user's current record
///
/// Reads fresh from the database, so a role or team change made since the
/// token was issued is reflected immediately.
pub async fn verify(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, principal.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authorized. Try login again.".to_string()))?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_field_errors_for_admin_role() {
        assert!(role_field_errors(Role::SubAdmin, None, None).is_empty());
    }

    #[test]
    fn test_role_field_errors_for_manager() {
        let errors = role_field_errors(Role::Manager, None, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "team");

        assert!(role_field_errors(Role::Manager, Some(Team::Sales), None).is_empty());
    }

    #[test]
    fn test_role_field_errors_for_member_reported_together() {
        let errors = role_field_errors(Role::TeamMember, None, None);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["team", "manager_id"]);

        let errors = role_field_errors(Role::TeamMember, Some(Team::Design), Some(Uuid::new_v4()));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            name: "".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
            title: String::new(),
            role: Role::TeamMember,
            team: None,
            manager_id: None,
            is_admin: false,
        };
        assert!(req.validate().is_err());
    }
}
