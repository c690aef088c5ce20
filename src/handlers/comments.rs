use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{comment, movie, user};
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::utils::jwt::SessionClaims;
use crate::utils::time::relative_time;
use crate::utils::validation::Validator;
use crate::AppState;

const MAX_COMMENTS: u64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub movie_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub movie_id: i32,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i32,
    pub movie_id: i32,
    pub author: String,
    pub content: String,
    pub timestamp: String,
    pub created_at: DateTime<Utc>,
    pub likes: i32,
    pub dislikes: i32,
}

impl CommentResponse {
    fn new(c: comment::Model, author: String, now: DateTime<Utc>) -> Self {
        let created_at = c.created_at.with_timezone(&Utc);
        Self {
            id: c.id,
            movie_id: c.movie_id,
            author,
            content: c.content,
            timestamp: relative_time(created_at, now),
            created_at,
            likes: c.likes,
            dislikes: c.dislikes,
        }
    }
}

/// Recent comments, optionally for a single movie
pub async fn list_comments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommentQuery>,
) -> AppResult<Json<Vec<CommentResponse>>> {
    let mut select = comment::Entity::find();
    if let Some(movie_id) = query.movie_id {
        select = select.filter(comment::Column::MovieId.eq(movie_id));
    }

    let rows = select
        .order_by_desc(comment::Column::CreatedAt)
        .limit(MAX_COMMENTS)
        .find_also_related(user::Entity)
        .all(&*state.db)
        .await?;

    let now = Utc::now();
    let comments = rows
        .into_iter()
        .map(|(c, u)| {
            let author = u.map(|u| u.name).unwrap_or_else(|| "Anonymous".to_string());
            CommentResponse::new(c, author, now)
        })
        .collect();

    Ok(Json(comments))
}

/// Post a comment as the signed-in user
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    Validator::new()
        .length("content", &payload.content, 1, 1000)
        .finish()?;

    movie::Entity::find_by_id(payload.movie_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    let created = comment::ActiveModel {
        movie_id: Set(payload.movie_id),
        user_id: Set(claims.sub),
        content: Set(payload.content.trim().to_string()),
        likes: Set(0),
        dislikes: Set(0),
        ..Default::default()
    }
    .insert(&*state.db)
    .await?;

    tracing::info!(comment_id = created.id, movie_id = created.movie_id, "Comment posted");

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::new(created, claims.name, Utc::now())),
    ))
}

async fn react(state: &AppState, comment_id: i32, column: comment::Column) -> AppResult<Json<CommentResponse>> {
    let result = comment::Entity::update_many()
        .col_expr(column, Expr::col(column).add(1))
        .filter(comment::Column::Id.eq(comment_id))
        .exec(&*state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let (updated, author) = comment::Entity::find_by_id(comment_id)
        .find_also_related(user::Entity)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    let author = author.map(|u| u.name).unwrap_or_else(|| "Anonymous".to_string());
    Ok(Json(CommentResponse::new(updated, author, Utc::now())))
}

pub async fn like_comment(
    State(state): State<AppState>,
    Extension(_claims): Extension<SessionClaims>,
    ApiPath(comment_id): ApiPath<i32>,
) -> AppResult<Json<CommentResponse>> {
    react(&state, comment_id, comment::Column::Likes).await
}

pub async fn dislike_comment(
    State(state): State<AppState>,
    Extension(_claims): Extension<SessionClaims>,
    ApiPath(comment_id): ApiPath<i32>,
) -> AppResult<Json<CommentResponse>> {
    react(&state, comment_id, comment::Column::Dislikes).await
}
