use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use crate::db::contains_ci;
use crate::entities::movie;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::utils::validation::Validator;
use crate::AppState;

// ============ Public Catalogue ============

#[derive(Debug, Default, Deserialize)]
pub struct MovieQuery {
    pub id: Option<i32>,
    pub iscomingsoon: Option<bool>,
    pub genre: Option<String>,
    pub title: Option<String>,
}

/// List movies, newest release first
pub async fn list_movies(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MovieQuery>,
) -> AppResult<Json<Vec<movie::Model>>> {
    let mut select = movie::Entity::find();

    if let Some(id) = query.id {
        select = select.filter(movie::Column::MovieId.eq(id));
    }
    if let Some(coming_soon) = query.iscomingsoon {
        select = select.filter(movie::Column::Iscomingsoon.eq(coming_soon));
    }
    if let Some(genre) = query.genre.as_deref().filter(|g| !g.trim().is_empty()) {
        select = select.filter(movie::Column::Genre.eq(genre.trim()));
    }
    if let Some(title) = query.title.as_deref().filter(|t| !t.trim().is_empty()) {
        select = select.filter(contains_ci(movie::Column::Title, title));
    }

    let movies = select
        .order_by_desc(movie::Column::ReleaseDate)
        .all(&*state.db)
        .await?;

    Ok(Json(movies))
}

// ============ Admin Management ============

// Missing fields arrive empty and are reported by validate_movie
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateMovieRequest {
    pub title: String,
    pub description: String,
    pub release_date: String,
    pub end_date: Option<String>,
    pub duration: i32,
    pub genre: String,
    pub rating: String,
    pub iscomingsoon: bool,
    pub posterurl: String,
    pub trailerurl: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub end_date: Option<String>,
    pub duration: Option<i32>,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub iscomingsoon: Option<bool>,
    pub posterurl: Option<String>,
    pub trailerurl: Option<String>,
}

/// Validated dates of a movie payload.
#[derive(Debug)]
struct MovieDates {
    release_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

fn validate_movie(payload: &UpdateMovieRequest) -> AppResult<MovieDates> {
    let mut v = Validator::new();

    if let Some(title) = &payload.title {
        v.length("title", title, 1, 255);
    }
    if let Some(description) = &payload.description {
        v.length("description", description, 0, 255);
    }
    if let Some(duration) = payload.duration {
        v.check(duration > 0, "duration", "duration must be a positive number of minutes");
    }
    if let Some(genre) = &payload.genre {
        v.length("genre", genre, 1, 10);
    }
    if let Some(rating) = &payload.rating {
        v.length("rating", rating, 1, 25);
    }
    if let Some(posterurl) = &payload.posterurl {
        v.url("posterurl", posterurl);
    }
    if let Some(trailerurl) = &payload.trailerurl {
        v.url("trailerurl", trailerurl);
    }

    let release_date = payload
        .release_date
        .as_deref()
        .and_then(|d| v.date("release_date", d));
    let end_date = payload
        .end_date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| v.date("end_date", d));

    if let (Some(release), Some(end)) = (release_date, end_date) {
        v.check(end >= release, "end_date", "end_date must not be before release_date");
    }

    v.finish()?;
    Ok(MovieDates {
        release_date,
        end_date,
    })
}

impl From<&CreateMovieRequest> for UpdateMovieRequest {
    fn from(req: &CreateMovieRequest) -> Self {
        Self {
            title: Some(req.title.clone()),
            description: Some(req.description.clone()),
            release_date: Some(req.release_date.clone()),
            end_date: req.end_date.clone(),
            duration: Some(req.duration),
            genre: Some(req.genre.clone()),
            rating: Some(req.rating.clone()),
            iscomingsoon: Some(req.iscomingsoon),
            posterurl: Some(req.posterurl.clone()),
            trailerurl: Some(req.trailerurl.clone()),
        }
    }
}

/// Create a movie (admin)
pub async fn create_movie(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateMovieRequest>,
) -> AppResult<(StatusCode, Json<movie::Model>)> {
    let dates = validate_movie(&UpdateMovieRequest::from(&payload))?;
    let release_date = dates
        .release_date
        .ok_or_else(|| AppError::BadRequest("release_date is required".to_string()))?;

    let new_movie = movie::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        release_date: Set(release_date),
        end_date: Set(dates.end_date),
        duration: Set(payload.duration),
        genre: Set(payload.genre.trim().to_string()),
        rating: Set(payload.rating.trim().to_string()),
        iscomingsoon: Set(payload.iscomingsoon),
        posterurl: Set(payload.posterurl.trim().to_string()),
        trailerurl: Set(payload.trailerurl.trim().to_string()),
        ..Default::default()
    };

    let movie = new_movie.insert(&*state.db).await?;
    tracing::info!(movie_id = movie.movie_id, title = %movie.title, "Movie created");

    Ok((StatusCode::CREATED, Json(movie)))
}

/// Update a movie (admin)
pub async fn update_movie(
    State(state): State<AppState>,
    ApiPath(movie_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateMovieRequest>,
) -> AppResult<Json<movie::Model>> {
    let dates = validate_movie(&payload)?;

    let existing = movie::Entity::find_by_id(movie_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    let mut active: movie::ActiveModel = existing.into();

    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(release_date) = dates.release_date {
        active.release_date = Set(release_date);
    }
    if payload.end_date.is_some() {
        active.end_date = Set(dates.end_date);
    }
    if let Some(duration) = payload.duration {
        active.duration = Set(duration);
    }
    if let Some(genre) = payload.genre {
        active.genre = Set(genre.trim().to_string());
    }
    if let Some(rating) = payload.rating {
        active.rating = Set(rating.trim().to_string());
    }
    if let Some(iscomingsoon) = payload.iscomingsoon {
        active.iscomingsoon = Set(iscomingsoon);
    }
    if let Some(posterurl) = payload.posterurl {
        active.posterurl = Set(posterurl.trim().to_string());
    }
    if let Some(trailerurl) = payload.trailerurl {
        active.trailerurl = Set(trailerurl.trim().to_string());
    }

    let updated = active.update(&*state.db).await?;
    Ok(Json(updated))
}

/// Delete a movie (admin)
pub async fn delete_movie(
    State(state): State<AppState>,
    ApiPath(movie_id): ApiPath<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let result = movie::Entity::delete_by_id(movie_id).exec(&*state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Movie not found".to_string()));
    }

    tracing::info!(movie_id, "Movie deleted");
    Ok(Json(serde_json::json!({ "message": "Movie deleted successfully" })))
}
