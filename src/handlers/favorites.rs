use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::entities::{favorite, movie};
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath};
use crate::utils::jwt::SessionClaims;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub movie_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub created_at: DateTime<Utc>,
    pub movie: Option<movie::Model>,
}

async fn find_favorite(
    state: &AppState,
    user_id: i32,
    movie_id: i32,
) -> AppResult<Option<favorite::Model>> {
    Ok(favorite::Entity::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::MovieId.eq(movie_id))
        .one(&*state.db)
        .await?)
}

/// Add or remove a movie from the signed-in user's favorites
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(payload): ApiJson<FavoriteRequest>,
) -> AppResult<Json<FavoriteStatus>> {
    let movie_id = payload
        .movie_id
        .ok_or_else(|| AppError::BadRequest("Movie ID is required".to_string()))?;

    movie::Entity::find_by_id(movie_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    if let Some(existing) = find_favorite(&state, claims.sub, movie_id).await? {
        existing.delete(&*state.db).await?;
        tracing::debug!(user_id = claims.sub, movie_id, "Favorite removed");
        return Ok(Json(FavoriteStatus { is_favorite: false }));
    }

    favorite::ActiveModel {
        user_id: Set(claims.sub),
        movie_id: Set(movie_id),
        ..Default::default()
    }
    .insert(&*state.db)
    .await?;

    tracing::debug!(user_id = claims.sub, movie_id, "Favorite added");
    Ok(Json(FavoriteStatus { is_favorite: true }))
}

/// The signed-in user's favorite movies
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> AppResult<Json<Vec<FavoriteResponse>>> {
    let rows = favorite::Entity::find()
        .filter(favorite::Column::UserId.eq(claims.sub))
        .order_by_desc(favorite::Column::CreatedAt)
        .find_also_related(movie::Entity)
        .all(&*state.db)
        .await?;

    let responses = rows
        .into_iter()
        .map(|(f, m)| FavoriteResponse {
            id: f.id,
            user_id: f.user_id,
            movie_id: f.movie_id,
            created_at: f.created_at.with_timezone(&Utc),
            movie: m,
        })
        .collect();

    Ok(Json(responses))
}

/// Whether a movie is in the signed-in user's favorites
pub async fn favorite_status(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiPath(movie_id): ApiPath<i32>,
) -> AppResult<Json<FavoriteStatus>> {
    let existing = find_favorite(&state, claims.sub, movie_id).await?;
    Ok(Json(FavoriteStatus {
        is_favorite: existing.is_some(),
    }))
}
