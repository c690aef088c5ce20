use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{booking, movie, showtime, user};
use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath};
use crate::utils::jwt::SessionClaims;
use crate::utils::seats::{conflicting_seats, parse_seats};
use crate::AppState;

// ============ Request/Response Types ============

/// Seats may arrive as a JSON array or as a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SeatSelection {
    List(Vec<String>),
    Joined(String),
}

impl SeatSelection {
    fn into_labels(self) -> Vec<String> {
        match self {
            SeatSelection::List(seats) => seats,
            SeatSelection::Joined(seats) => seats
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub showtime_id: Option<i32>,
    pub seats: Option<SeatSelection>,
    pub total_price: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: i32,
    pub user_id: i32,
    pub showtime_id: i32,
    pub seats: Vec<String>,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

impl From<booking::Model> for BookingResponse {
    fn from(b: booking::Model) -> Self {
        Self {
            seats: b.seat_labels(),
            id: b.id,
            user_id: b.user_id,
            showtime_id: b.showtime_id,
            total_price: b.total_price,
            created_at: b.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: BookingResponse,
    pub start_time: Option<DateTime<Utc>>,
    pub movie_title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBookingResponse {
    #[serde(flatten)]
    pub booking: BookingResponse,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

// ============ User Bookings ============

/// Book seats for a showtime
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiJson(payload): ApiJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    let (Some(showtime_id), Some(seats), Some(total_price)) =
        (payload.showtime_id, payload.seats, payload.total_price)
    else {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    };

    let seats = parse_seats(&seats.into_labels()).map_err(AppError::BadRequest)?;
    if !total_price.is_finite() || total_price <= 0.0 {
        return Err(AppError::BadRequest(
            "totalPrice must be a positive amount".to_string(),
        ));
    }

    let txn = state.db.begin().await?;

    // Row lock serializes concurrent bookings for the same showtime
    let showtime = showtime::Entity::find_by_id(showtime_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Showtime not found".to_string()))?;

    if showtime.start_time.with_timezone(&Utc) <= Utc::now() {
        return Err(AppError::BadRequest(
            "Cannot book a showtime that has already started".to_string(),
        ));
    }

    let taken: HashSet<String> = booking::Entity::find()
        .filter(booking::Column::ShowtimeId.eq(showtime_id))
        .all(&txn)
        .await?
        .iter()
        .flat_map(|b| b.seat_labels())
        .collect();

    let conflicts = conflicting_seats(&seats, &taken);
    if !conflicts.is_empty() {
        return Err(AppError::Conflict(format!(
            "Seats already booked: {}",
            conflicts.join(", ")
        )));
    }

    let new_booking = booking::ActiveModel {
        user_id: Set(claims.sub),
        showtime_id: Set(showtime_id),
        seats: Set(seats.join(",")),
        total_price: Set(total_price),
        ..Default::default()
    };

    let created = new_booking.insert(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        booking_id = created.id,
        user_id = claims.sub,
        showtime_id,
        seats = %created.seats,
        "Booking created"
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Bookings of the signed-in user, newest first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let rows = booking::Entity::find()
        .filter(booking::Column::UserId.eq(claims.sub))
        .order_by_desc(booking::Column::CreatedAt)
        .find_also_related(showtime::Entity)
        .all(&*state.db)
        .await?;

    let movie_ids: Vec<i32> = rows
        .iter()
        .filter_map(|(_, s)| s.as_ref().map(|s| s.movie_id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let titles: HashMap<i32, String> = if movie_ids.is_empty() {
        HashMap::new()
    } else {
        movie::Entity::find()
            .filter(movie::Column::MovieId.is_in(movie_ids))
            .all(&*state.db)
            .await?
            .into_iter()
            .map(|m| (m.movie_id, m.title))
            .collect()
    };

    let responses = rows
        .into_iter()
        .map(|(b, s)| BookingDetails {
            start_time: s.as_ref().map(|s| s.start_time.with_timezone(&Utc)),
            movie_title: s.and_then(|s| titles.get(&s.movie_id).cloned()),
            booking: b.into(),
        })
        .collect();

    Ok(Json(responses))
}

/// Cancel one of the signed-in user's bookings
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    ApiPath(booking_id): ApiPath<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = booking::Entity::find_by_id(booking_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if existing.user_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only cancel your own bookings".to_string(),
        ));
    }

    let showtime = existing
        .find_related(showtime::Entity)
        .one(&*state.db)
        .await?;

    if let Some(showtime) = showtime {
        if showtime.start_time.with_timezone(&Utc) <= Utc::now() {
            return Err(AppError::BadRequest(
                "Cannot cancel a booking after the showtime has started".to_string(),
            ));
        }
    }

    existing.delete(&*state.db).await?;
    tracing::info!(booking_id, user_id = claims.sub, "Booking cancelled");

    Ok(Json(serde_json::json!({ "message": "Booking cancelled successfully" })))
}

// ============ Admin ============

/// All bookings with their customer (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminBookingResponse>>> {
    let rows = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(&*state.db)
        .await?;

    let responses = rows
        .into_iter()
        .map(|(b, u)| AdminBookingResponse {
            user_name: u.as_ref().map(|u| u.name.clone()),
            user_email: u.map(|u| u.email),
            booking: b.into(),
        })
        .collect();

    Ok(Json(responses))
}
