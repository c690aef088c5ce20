use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;

use crate::entities::{auth_provider, user};
use crate::error::{AppError, AppResult};
use crate::extract::{ApiPath, ApiQuery};
use crate::handlers::auth::session_response;
use crate::services::oauth::{OAuthProfile, OAuthProvider};
use crate::AppState;

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_PATH: &str = "/api/auth/oauth";
const USERNAME_MAX: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Redirect the browser to the provider's consent page
pub async fn start(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiPath(provider): ApiPath<String>,
) -> AppResult<Response> {
    let provider: OAuthProvider = provider.parse()?;
    let csrf_state = random_state();
    let url = state.oauth.authorization_url(provider, &csrf_state)?;

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, csrf_state))
        .http_only(true)
        .secure(state.config.production)
        .same_site(SameSite::Lax)
        .path(OAUTH_STATE_PATH)
        .max_age(time::Duration::minutes(10))
        .build();

    Ok((jar.add(cookie), Redirect::temporary(&url)).into_response())
}

/// Complete the authorization-code flow and issue a session token
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiPath(provider): ApiPath<String>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
) -> AppResult<Response> {
    let provider: OAuthProvider = provider.parse()?;

    if let Some(error) = query.error {
        tracing::warn!(provider = provider.as_str(), error = %error, "OAuth sign-in denied");
        return Err(AppError::Unauthorized("OAuth sign-in was cancelled".to_string()));
    }

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (expected, query.state) {
        (Some(expected), Some(actual)) if expected == actual => {}
        _ => return Err(AppError::Unauthorized("Invalid OAuth state".to_string())),
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let profile = state.oauth.fetch_profile(provider, &code).await?;
    let found = find_or_create_user(&*state.db, provider, profile).await?;
    let body = session_response(&state, found, provider.kind())?;

    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path(OAUTH_STATE_PATH));
    Ok((jar, Json(body)).into_response())
}

/// Resolve an OAuth profile to a local user, linking or creating as needed.
async fn find_or_create_user(
    db: &DatabaseConnection,
    provider: OAuthProvider,
    profile: OAuthProfile,
) -> AppResult<user::Model> {
    let email = profile
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required for OAuth sign-in".to_string()))?;

    let linked = auth_provider::Entity::find()
        .filter(auth_provider::Column::Provider.eq(provider.kind()))
        .filter(auth_provider::Column::ProviderId.eq(profile.provider_id.clone()))
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    if let Some((_, Some(existing))) = linked {
        return Ok(existing);
    }

    let txn = db.begin().await?;

    let account = match user::Entity::find()
        .filter(user::Column::Email.eq(email.clone()))
        .one(&txn)
        .await?
    {
        Some(existing) => existing,
        None => {
            let local_part = email.split('@').next().unwrap_or_default();
            let base = username_base(local_part);
            let username = unique_username(&txn, &base).await?;

            let created = user::ActiveModel {
                name: Set(profile.name.clone().unwrap_or_else(|| base.clone())),
                username: Set(username),
                email: Set(email.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            tracing::info!(user_id = created.id, provider = provider.as_str(), "User created via OAuth");
            created
        }
    };

    auth_provider::ActiveModel {
        user_id: Set(account.id),
        provider: Set(provider.kind()),
        provider_id: Set(Some(profile.provider_id)),
        password: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(account)
}

fn username_base(local_part: &str) -> String {
    let cleaned: String = local_part
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(USERNAME_MAX - 5)
        .collect();

    if cleaned.len() < 3 {
        format!("user{}", cleaned)
    } else {
        cleaned
    }
}

async fn unique_username<C: sea_orm::ConnectionTrait>(db: &C, base: &str) -> AppResult<String> {
    let mut candidate = base.to_string();

    for _ in 0..5 {
        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(candidate.clone()))
            .one(db)
            .await?
            .is_some();

        if !taken {
            return Ok(candidate);
        }

        candidate = format!("{}{:04}", base, rand::thread_rng().gen_range(0..10_000));
    }

    Err(AppError::Conflict("Could not allocate a username".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_state_is_alphanumeric() {
        let a = random_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, random_state());
    }

    #[test]
    fn test_username_base() {
        assert_eq!(username_base("jane.doe"), "jane.doe");
        assert_eq!(username_base("a+b"), "userab");
        assert_eq!(username_base(&"x".repeat(80)).len(), USERNAME_MAX - 5);
    }
}
