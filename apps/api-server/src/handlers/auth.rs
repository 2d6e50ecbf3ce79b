//! Authentication handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;
use validator::ValidateEmail;

use quill_core::domain::{Role, User};
use quill_core::ports::{PasswordService, TokenService};
use quill_infra::auth::MIN_PASSWORD_LENGTH;
use quill_shared::FieldErrorBody;
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MAX_NAME: usize = 255;

fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role.to_string(),
        created_at: user.created_at,
    }
}

fn issue_token(token_service: &dyn TokenService, user: &User) -> AppResult<AuthResponse> {
    let token = token_service.generate_token(user.id, &user.email, user.role)?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
        user: user_response(user),
    })
}

fn check_registration(req: &RegisterUserRequest) -> AppResult<()> {
    let mut errors = Vec::new();
    let mut reject = |field: &str, message: String| {
        errors.push(FieldErrorBody {
            field: field.to_string(),
            message,
        })
    };

    if req.name.trim().is_empty() {
        reject("name", "The name field is required.".to_string());
    } else if req.name.chars().count() > MAX_NAME {
        reject(
            "name",
            format!("The name may not be greater than {MAX_NAME} characters."),
        );
    }
    if !req.email.validate_email() {
        reject("email", "The email must be a valid email address.".to_string());
    }
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        reject(
            "password",
            format!("The password must be at least {MIN_PASSWORD_LENGTH} characters."),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let mut req = body.into_inner();
    req.email = req.email.trim().to_lowercase();
    check_registration(&req)?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let role = if state.bootstrap_admin_email.as_deref() == Some(req.email.as_str()) {
        Role::Admin
    } else {
        Role::Author
    };

    let password_hash = password_service.hash(&req.password)?;
    let user = User::new(
        req.name.trim().to_string(),
        req.email,
        password_hash,
        role,
        state.clock.now(),
    );
    let user = state.users.insert(user).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok(HttpResponse::Created().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(&req.email.trim().to_lowercase())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !password_service.verify(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Rejected login with wrong password");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(email = %identity.email, "Token refers to a deleted user");
            AppError::Unauthorized
        })?;

    Ok(HttpResponse::Ok().json(user_response(&user)))
}
