use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::Deserialize;

use crate::db::contains_ci;
use crate::entities::cinema;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::utils::pagination::{ListResponse, PageParams};
use crate::AppState;

const NO_CINEMAS: &str = "No cinemas found for the specified filters.";

#[derive(Debug, Default, Deserialize)]
pub struct CinemaQuery {
    pub cinema_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Look up one cinema by id, or list cinemas with filters
pub async fn list_cinemas(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CinemaQuery>,
) -> AppResult<Response> {
    if let Some(raw) = query.cinema_id.as_deref().filter(|c| !c.trim().is_empty()) {
        let cinema_id: i32 = raw
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest("cinema_id must be an integer.".to_string()))?;

        let cinema = cinema::Entity::find_by_id(cinema_id)
            .one(&*state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Cinema not found.".to_string()))?;

        return Ok(Json(cinema).into_response());
    }

    let window = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve()?;

    let mut select = cinema::Entity::find();
    if let Some(name) = query.name.as_deref().filter(|n| !n.trim().is_empty()) {
        select = select.filter(contains_ci(cinema::Column::Name, name));
    }
    if let Some(location) = query.location.as_deref().filter(|l| !l.trim().is_empty()) {
        select = select.filter(contains_ci(cinema::Column::Location, location));
    }

    let total = select.clone().count(&*state.db).await?;
    let cinemas = select
        .order_by_asc(cinema::Column::Name)
        .offset(window.offset)
        .limit(window.limit)
        .all(&*state.db)
        .await?;

    Ok(Json(ListResponse::build(cinemas, total, window.page, window.limit, NO_CINEMAS)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CreateCinemaRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub opening_hours: Option<String>,
}

/// Register a cinema (admin)
pub async fn create_cinema(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCinemaRequest>,
) -> AppResult<(StatusCode, Json<cinema::Model>)> {
    let required = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let (Some(name), Some(location)) = (required(payload.name), required(payload.location)) else {
        return Err(AppError::BadRequest("Name and location are required.".to_string()));
    };

    let new_cinema = cinema::ActiveModel {
        name: Set(name),
        location: Set(location),
        opening_hours: Set(required(payload.opening_hours)),
        ..Default::default()
    };

    let created = new_cinema.insert(&*state.db).await?;
    tracing::info!(cinema_id = created.cinema_id, name = %created.name, "Cinema created");

    Ok((StatusCode::CREATED, Json(created)))
}
