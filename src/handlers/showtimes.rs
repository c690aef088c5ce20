use std::collections::BTreeSet;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, SelectTwo, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{booking, cinema, movie, showtime};
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::utils::pagination::{ListResponse, PageParams};
use crate::utils::seats::SeatLayout;
use crate::AppState;

const NO_SHOWTIMES: &str = "No showtimes found for the specified filters.";

// ============ Public Listing ============

#[derive(Debug, Default, Deserialize)]
pub struct ShowtimeQuery {
    pub movie_id: Option<String>,
    pub show_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShowtimeResponse {
    pub showtime_id: i32,
    pub movie_id: i32,
    pub cinema_id: Option<i32>,
    pub show_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub runtime: i32,
    pub movie: Option<movie::Model>,
}

impl ShowtimeResponse {
    fn new(showtime: showtime::Model, movie: Option<movie::Model>) -> Self {
        Self {
            showtime_id: showtime.showtime_id,
            movie_id: showtime.movie_id,
            cinema_id: showtime.cinema_id,
            show_date: showtime.show_date,
            start_time: showtime.start_time.with_timezone(&Utc),
            runtime: showtime.runtime,
            movie,
        }
    }
}

fn filtered_showtimes(movie_id: Option<i32>, show_date: Option<NaiveDate>) -> Select<showtime::Entity> {
    let mut select = showtime::Entity::find();
    if let Some(movie_id) = movie_id {
        select = select.filter(showtime::Column::MovieId.eq(movie_id));
    }
    if let Some(show_date) = show_date {
        select = select.filter(showtime::Column::ShowDate.eq(show_date));
    }
    select
}

/// Ordered showtimes joined with their movie; one row per movie when `per_movie`.
fn showtime_page(
    select: Select<showtime::Entity>,
    per_movie: bool,
) -> SelectTwo<showtime::Entity, movie::Entity> {
    let mut select = select
        .order_by_asc(showtime::Column::MovieId)
        .order_by_asc(showtime::Column::StartTime);

    // Qualified: the joined movie table has its own movie_id
    if per_movie {
        select = select.distinct_on([(showtime::Entity, showtime::Column::MovieId)]);
    }

    select.find_also_related(movie::Entity)
}

/// List showtimes with optional movie/date filters
pub async fn list_showtimes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ShowtimeQuery>,
) -> AppResult<Json<ListResponse<ShowtimeResponse>>> {
    let window = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve()?;

    let movie_id = match query.movie_id.as_deref().filter(|m| !m.trim().is_empty()) {
        Some(raw) => Some(
            raw.trim()
                .parse::<i32>()
                .map_err(|_| AppError::BadRequest("movie_id must be an integer.".to_string()))?,
        ),
        None => None,
    };

    let show_date = match query.show_date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(raw) => Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            AppError::BadRequest("show_date must be in YYYY-MM-DD format.".to_string())
        })?),
        None => None,
    };

    let select = filtered_showtimes(movie_id, show_date);
    let total = select.clone().count(&*state.db).await?;

    let rows = showtime_page(select, show_date.is_some())
        .offset(window.offset)
        .limit(window.limit)
        .all(&*state.db)
        .await?;

    let data: Vec<ShowtimeResponse> = rows
        .into_iter()
        .map(|(s, m)| ShowtimeResponse::new(s, m))
        .collect();

    Ok(Json(ListResponse::build(data, total, window.page, window.limit, NO_SHOWTIMES)))
}

#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    pub showtime_id: i32,
    pub layout: SeatLayout,
    pub booked_seats: Vec<String>,
}

/// Booked seats for a showtime
pub async fn seat_map(
    State(state): State<AppState>,
    ApiPath(showtime_id): ApiPath<i32>,
) -> AppResult<Json<SeatMapResponse>> {
    showtime::Entity::find_by_id(showtime_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Showtime not found".to_string()))?;

    let bookings = booking::Entity::find()
        .filter(booking::Column::ShowtimeId.eq(showtime_id))
        .all(&*state.db)
        .await?;

    let booked: BTreeSet<String> = bookings.iter().flat_map(|b| b.seat_labels()).collect();

    Ok(Json(SeatMapResponse {
        showtime_id,
        layout: SeatLayout::standard(),
        booked_seats: booked.into_iter().collect(),
    }))
}

// ============ Admin Management ============

#[derive(Debug, Deserialize)]
pub struct CreateShowtimeRequest {
    pub movie_id: i32,
    pub cinema_id: Option<i32>,
    pub show_date: Option<NaiveDate>,
    pub start_time: DateTime<Utc>,
    pub runtime: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShowtimeRequest {
    pub movie_id: Option<i32>,
    pub cinema_id: Option<i32>,
    pub show_date: Option<NaiveDate>,
    pub start_time: Option<DateTime<Utc>>,
    pub runtime: Option<i32>,
}

async fn find_movie(db: &DatabaseConnection, movie_id: i32) -> AppResult<movie::Model> {
    movie::Entity::find_by_id(movie_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid movie".to_string()))
}

async fn ensure_cinema(db: &DatabaseConnection, cinema_id: i32) -> AppResult<()> {
    cinema::Entity::find_by_id(cinema_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid cinema".to_string()))?;
    Ok(())
}

fn ensure_runtime(runtime: i32) -> AppResult<()> {
    if runtime <= 0 {
        return Err(AppError::BadRequest(
            "runtime must be a positive number of minutes".to_string(),
        ));
    }
    Ok(())
}

/// Schedule a showtime (admin)
pub async fn create_showtime(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateShowtimeRequest>,
) -> AppResult<(StatusCode, Json<ShowtimeResponse>)> {
    let movie = find_movie(&*state.db, payload.movie_id).await?;
    if let Some(cinema_id) = payload.cinema_id {
        ensure_cinema(&*state.db, cinema_id).await?;
    }

    let runtime = payload.runtime.unwrap_or(movie.duration);
    ensure_runtime(runtime)?;

    let new_showtime = showtime::ActiveModel {
        movie_id: Set(movie.movie_id),
        cinema_id: Set(payload.cinema_id),
        show_date: Set(payload
            .show_date
            .unwrap_or_else(|| payload.start_time.date_naive())),
        start_time: Set(payload.start_time.into()),
        runtime: Set(runtime),
        ..Default::default()
    };

    let created = new_showtime.insert(&*state.db).await?;
    tracing::info!(
        showtime_id = created.showtime_id,
        movie_id = created.movie_id,
        "Showtime created"
    );

    Ok((StatusCode::CREATED, Json(ShowtimeResponse::new(created, Some(movie)))))
}

/// Update a showtime (admin)
pub async fn update_showtime(
    State(state): State<AppState>,
    ApiPath(showtime_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateShowtimeRequest>,
) -> AppResult<Json<ShowtimeResponse>> {
    let existing = showtime::Entity::find_by_id(showtime_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Showtime not found".to_string()))?;

    let movie = find_movie(&*state.db, payload.movie_id.unwrap_or(existing.movie_id)).await?;
    if let Some(cinema_id) = payload.cinema_id {
        ensure_cinema(&*state.db, cinema_id).await?;
    }
    if let Some(runtime) = payload.runtime {
        ensure_runtime(runtime)?;
    }

    let mut active: showtime::ActiveModel = existing.into();
    active.movie_id = Set(movie.movie_id);

    if let Some(cinema_id) = payload.cinema_id {
        active.cinema_id = Set(Some(cinema_id));
    }
    if let Some(start_time) = payload.start_time {
        active.start_time = Set(start_time.into());
        if payload.show_date.is_none() {
            active.show_date = Set(start_time.date_naive());
        }
    }
    if let Some(show_date) = payload.show_date {
        active.show_date = Set(show_date);
    }
    if let Some(runtime) = payload.runtime {
        active.runtime = Set(runtime);
    }

    let updated = active.update(&*state.db).await?;
    Ok(Json(ShowtimeResponse::new(updated, Some(movie))))
}

/// Delete a showtime (admin)
pub async fn delete_showtime(
    State(state): State<AppState>,
    ApiPath(showtime_id): ApiPath<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let result = showtime::Entity::delete_by_id(showtime_id)
        .exec(&*state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Showtime not found".to_string()));
    }

    tracing::info!(showtime_id, "Showtime deleted");
    Ok(Json(serde_json::json!({ "message": "Showtime deleted successfully" })))
}
