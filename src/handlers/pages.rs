use axum::{
    extract::State,
    response::{Html, Redirect},
    Json,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::Serialize;

use crate::entities::{booking, cinema, movie, showtime, user};
use crate::error::{AppError, AppResult};
use crate::AppState;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Admin sign in</title>
</head>
<body>
  <h1>Admin sign in</h1>
  <form id="login">
    <label>Email <input name="email" type="email" required></label>
    <label>Password <input name="password" type="password" required></label>
    <button type="submit">Sign in</button>
  </form>
  <p id="error" role="alert"></p>
  <script>
    document.getElementById("login").addEventListener("submit", async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const response = await fetch("/api/admin/login", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ email: form.get("email"), password: form.get("password") }),
      });
      if (response.ok) {
        window.location.href = "/admin/dashboard";
      } else {
        const body = await response.json();
        document.getElementById("error").textContent = body.error;
      }
    });
  </script>
</body>
</html>
"#;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub movies: u64,
    pub showtimes: u64,
    pub cinemas: u64,
    pub bookings: u64,
    pub users: u64,
}

pub async fn admin_login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn admin_home() -> Redirect {
    Redirect::temporary("/admin/dashboard")
}

/// Unknown dashboard page, reached only past the admin gate
pub async fn admin_not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}

/// Catalogue and sales totals for the dashboard
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(DashboardStats {
        movies: movie::Entity::find().count(&*state.db).await?,
        showtimes: showtime::Entity::find().count(&*state.db).await?,
        cinemas: cinema::Entity::find().count(&*state.db).await?,
        bookings: booking::Entity::find().count(&*state.db).await?,
        users: user::Entity::find().count(&*state.db).await?,
    }))
}
