use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_admin_token, verify_session_token, AdminClaims};
use crate::AppState;

/// Name of the cookie holding the admin token.
pub const ADMIN_COOKIE: &str = "token";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Extract and validate the user session token from the Authorization header
pub async fn user_auth(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(auth) =
        auth.ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

    let claims = verify_session_token(auth.token(), &state.config.session_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn admin_claims(state: &AppState, jar: &CookieJar) -> AppResult<AdminClaims> {
    let token = jar
        .get(ADMIN_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Admin login required".to_string()))?;

    let claims = verify_admin_token(&token, &state.config.jwt_secret)?;
    if claims.role != "admin" {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(claims)
}

/// Require a valid admin cookie on admin API routes
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = admin_claims(&state, &jar)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Gate `/admin/*` pages, sending anyone without a valid token to the login page
pub async fn admin_page_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == ADMIN_LOGIN_PATH {
        return next.run(request).await;
    }

    match admin_claims(&state, &jar) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), error = %e, "Admin page access denied");
            Redirect::temporary(ADMIN_LOGIN_PATH).into_response()
        }
    }
}
