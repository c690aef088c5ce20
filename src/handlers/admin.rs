use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;

use crate::entities::admin;
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::middleware::auth::ADMIN_COOKIE;
use crate::utils::jwt::{create_admin_token, ADMIN_TOKEN_TTL_SECONDS};
use crate::utils::password::{hash_password, verify_password};
use crate::AppState;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Sign in to the admin dashboard; the token travels in an httpOnly cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<AdminLoginRequest>,
) -> AppResult<Response> {
    let (Some(email), Some(password)) = (
        payload.email.filter(|e| !e.trim().is_empty()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let account = admin::Entity::find()
        .filter(admin::Column::Email.eq(email.trim().to_lowercase()))
        .one(&*state.db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &account.password)? {
        tracing::warn!(email = %account.email, "Admin login failed");
        return Err(invalid());
    }

    let token = create_admin_token(account.id, &account.role, &state.config.jwt_secret)?;

    let cookie = Cookie::build((ADMIN_COOKIE, token))
        .http_only(true)
        .secure(state.config.production)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(ADMIN_TOKEN_TTL_SECONDS))
        .build();

    tracing::info!(admin_id = account.id, "Admin signed in");

    Ok((
        jar.add(cookie),
        Json(serde_json::json!({ "message": "Login successful" })),
    )
        .into_response())
}

/// Only POST is accepted on the login endpoint
pub async fn login_method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Clear the admin cookie
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(ADMIN_COOKIE).path("/")),
        Json(serde_json::json!({ "message": "Logged out" })),
    )
}

/// Create the configured admin account unless it already exists.
pub async fn seed_admin(db: &DatabaseConnection, email: &str, password: &str) -> AppResult<()> {
    let email = email.trim().to_lowercase();

    let existing = admin::Entity::find()
        .filter(admin::Column::Email.eq(email.clone()))
        .one(db)
        .await?;

    if existing.is_some() {
        tracing::debug!(email = %email, "Admin account already present");
        return Ok(());
    }

    admin::ActiveModel {
        email: Set(email.clone()),
        password: Set(hash_password(password)?),
        role: Set(ADMIN_ROLE.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(email = %email, "Admin account created");
    Ok(())
}
