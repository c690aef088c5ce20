use std::convert::Infallible;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    admin, auth, bookings, cinemas, comments, favorites, movies, oauth, pages, showtimes,
    subscribe, uploads,
};
use crate::middleware::auth::{admin_page_gate, require_admin, user_auth};
use crate::middleware::rate_limit::{create_public_governor, log_request};
use crate::middleware::user_rate_limit::create_user_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Per-IP limits for unauthenticated credential endpoints
    let public_governor = create_public_governor();
    // Per-user limits for signed-in routes
    let user_governor = create_user_governor();

    // Sign up / sign in (rate limited per IP)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/otp/request", post(auth::request_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .route("/oauth/{provider}", get(oauth::start))
        .route("/oauth/{provider}/callback", get(oauth::callback))
        .layer(public_governor.clone());

    // Catalogue browsing
    let public_routes = Router::new()
        .route("/movies", get(movies::list_movies))
        .route("/showtime", get(showtimes::list_showtimes))
        .route("/showtime/{id}/seats", get(showtimes::seat_map))
        .route("/cinemas", get(cinemas::list_cinemas))
        .route("/comments", get(comments::list_comments))
        .route("/subscribe", post(subscribe::subscribe));

    // Signed-in user routes (session token + per-user rate limit)
    let user_routes = Router::new()
        .route("/auth/session", get(auth::session))
        .route("/booking", post(bookings::create_booking))
        .route("/booking", get(bookings::my_bookings))
        .route("/booking/{id}", delete(bookings::cancel_booking))
        .route("/favorite", post(favorites::toggle_favorite))
        .route("/favorite", get(favorites::list_favorites))
        .route("/favorite/{movie_id}", get(favorites::favorite_status))
        .route("/comments", post(comments::create_comment))
        .route("/comments/{id}/like", post(comments::like_comment))
        .route("/comments/{id}/dislike", post(comments::dislike_comment))
        .layer(user_governor)
        .layer(middleware::from_fn_with_state(state.clone(), user_auth));

    // Admin login is the only admin API route without the cookie gate
    let admin_login = Router::new()
        .route(
            "/login",
            post(admin::login).get(admin::login_method_not_allowed),
        )
        .layer(public_governor);

    let admin_routes = Router::new()
        .route("/logout", post(admin::logout))
        // Movies
        .route("/movies", post(movies::create_movie))
        .route("/movies/{id}", put(movies::update_movie))
        .route("/movies/{id}", delete(movies::delete_movie))
        // Showtimes
        .route("/showtimes", post(showtimes::create_showtime))
        .route("/showtimes/{id}", put(showtimes::update_showtime))
        .route("/showtimes/{id}", delete(showtimes::delete_showtime))
        // Cinemas
        .route("/cinemas", post(cinemas::create_cinema))
        // Bookings
        .route("/bookings", get(bookings::list_all_bookings))
        // Poster uploads
        .route(
            "/uploads",
            post(uploads::upload_file)
                .layer::<_, Infallible>(DefaultBodyLimit::disable())
                .layer::<_, Infallible>(RequestBodyLimitLayer::new(state.config.max_upload_bytes)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Dashboard pages; the gate lets /admin/login through and covers unknown /admin paths
    let admin_pages = Router::new()
        .route("/admin", get(pages::admin_home))
        .route("/admin/login", get(pages::admin_login_page))
        .route("/admin/dashboard", get(pages::dashboard))
        .route("/admin/{*path}", get(pages::admin_not_found))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_page_gate));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_login.merge(admin_routes))
        .nest("/api", public_routes.merge(user_routes))
        .merge(admin_pages)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
