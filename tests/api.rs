use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
use serde_json::{json, Value as Json};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use cinema_booking_backend::{
    config::Config,
    entities::{
        admin,
        auth_provider::{self, ProviderKind},
        booking, cinema, favorite, movie, otp_code, showtime, user,
    },
    routes::create_router,
    utils::jwt::{create_admin_token, create_session_token},
    utils::password::hash_password,
    AppState,
};

const ADMIN_SECRET: &str = "admin-test-secret";
const SESSION_SECRET: &str = "session-test-secret";

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        jwt_secret: ADMIN_SECRET.to_string(),
        session_secret: SESSION_SECRET.to_string(),
        session_expiration_hours: 24,
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        production: false,
        public_base_url: "http://localhost:3000".to_string(),
        otp_ttl_minutes: 5,
        otp_dev_code: None,
        admin_email: None,
        admin_password: None,
        google: None,
        facebook: None,
        s3: None,
        mailchimp: None,
        max_upload_bytes: 1024 * 1024,
    }
}

fn app(db: DatabaseConnection) -> Router {
    app_with(db, test_config())
}

fn app_with(db: DatabaseConnection, config: Config) -> Router {
    create_router(AppState::new(db, config))
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn request(method: Method, uri: &str, body: Option<Json>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let mut request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    // Peer address for the per-IP rate limiter
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    request
}

fn with_header(mut request: Request<Body>, name: header::HeaderName, value: &str) -> Request<Body> {
    request.headers_mut().insert(name, value.parse().unwrap());
    request
}

fn admin_cookie() -> String {
    format!("token={}", create_admin_token(1, "admin", ADMIN_SECRET).unwrap())
}

fn bearer(user: &user::Model) -> String {
    let token =
        create_session_token(user, ProviderKind::Credentials, SESSION_SECRET, 24).unwrap();
    format!("Bearer {}", token)
}

async fn body_json(response: Response) -> Json {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_movie(id: i32) -> movie::Model {
    movie::Model {
        movie_id: id,
        title: "Inside Out 2".to_string(),
        description: "Riley enters her teenage years.".to_string(),
        release_date: NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
        end_date: None,
        duration: 96,
        genre: "Animation".to_string(),
        rating: "PG".to_string(),
        iscomingsoon: false,
        posterurl: "https://cdn.example.com/io2.jpg".to_string(),
        trailerurl: "https://youtube.com/watch?v=io2".to_string(),
        created_at: Utc::now().into(),
    }
}

fn sample_user() -> user::Model {
    user::Model {
        id: 5,
        name: "Jamie Rivera".to_string(),
        username: "jrivera".to_string(),
        email: "jamie@example.com".to_string(),
        dob: None,
        phone_number: Some("+15550100".to_string()),
        created_at: Utc::now().into(),
    }
}

// ============ Movies ============

#[tokio::test]
async fn test_list_movies_returns_array() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_movie(1), sample_movie(2)]])
        .into_connection();

    let response = app(db)
        .oneshot(request(Method::GET, "/api/movies?iscomingsoon=false", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["title"], "Inside Out 2");
}

#[tokio::test]
async fn test_admin_api_requires_cookie() {
    let payload = json!({ "title": "Anything" });
    let response = app(empty_db())
        .oneshot(request(Method::POST, "/api/admin/movies", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_create_movie_rejects_invalid_fields() {
    let payload = json!({
        "title": "Inside Out 2",
        "release_date": "next summer",
        "duration": 0,
        "genre": "Animation",
        "rating": "PG",
        "posterurl": "poster.jpg",
        "trailerurl": "https://youtube.com/watch?v=io2"
    });

    let req = with_header(
        request(Method::POST, "/api/admin/movies", Some(payload)),
        header::COOKIE,
        &admin_cookie(),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid input");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"duration"));
    assert!(fields.contains(&"posterurl"));
    assert!(fields.contains(&"release_date"));
}

#[tokio::test]
async fn test_create_movie_returns_created() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_movie(7)]])
        .append_exec_results([MockExecResult {
            last_insert_id: 7,
            rows_affected: 1,
        }])
        .into_connection();

    let payload = json!({
        "title": "Inside Out 2",
        "description": "Riley enters her teenage years.",
        "release_date": "2024-06-14",
        "duration": 96,
        "genre": "Animation",
        "rating": "PG",
        "posterurl": "https://cdn.example.com/io2.jpg",
        "trailerurl": "https://youtube.com/watch?v=io2"
    });

    let req = with_header(
        request(Method::POST, "/api/admin/movies", Some(payload)),
        header::COOKIE,
        &admin_cookie(),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["movie_id"], 7);
}

#[tokio::test]
async fn test_missing_movie_fields_report_details() {
    let req = with_header(
        request(Method::POST, "/api/admin/movies", Some(json!({ "title": "x" }))),
        header::COOKIE,
        &admin_cookie(),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid input");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    for field in ["release_date", "duration", "genre", "rating", "posterurl", "trailerurl"] {
        assert!(fields.contains(&field), "missing {field} in {fields:?}");
    }
    assert!(!fields.contains(&"title"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let req = with_header(
        request(Method::POST, "/api/admin/movies", Some(json!({ "duration": "long" }))),
        header::COOKIE,
        &admin_cookie(),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

// ============ Showtimes & Cinemas ============

#[tokio::test]
async fn test_showtimes_empty_result_message() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[BTreeMap::from([("num_items", Value::BigInt(Some(0)))])]])
        .append_query_results([Vec::<showtime::Model>::new()])
        .into_connection();

    let response = app(db)
        .oneshot(request(Method::GET, "/api/showtime?movie_id=3", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "No showtimes found for the specified filters." })
    );
}

#[tokio::test]
async fn test_showtimes_reject_bad_date() {
    let response = app(empty_db())
        .oneshot(request(Method::GET, "/api/showtime?show_date=14-06-2024", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cinemas_reject_non_positive_page() {
    let response = app(empty_db())
        .oneshot(request(Method::GET, "/api/cinemas?page=0&limit=10", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Page and limit must be positive integers."
    );
}

#[tokio::test]
async fn test_unknown_cinema_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<cinema::Model>::new()])
        .into_connection();

    let response = app(db)
        .oneshot(request(Method::GET, "/api/cinemas?cinema_id=99", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Cinema not found.");
}

fn future_showtime(id: i32, movie_id: i32) -> showtime::Model {
    let start = Utc::now() + Duration::days(2);
    showtime::Model {
        showtime_id: id,
        movie_id,
        cinema_id: Some(1),
        show_date: start.date_naive(),
        start_time: start.into(),
        runtime: 96,
    }
}

fn past_showtime(id: i32) -> showtime::Model {
    let start = Utc::now() - Duration::hours(1);
    showtime::Model {
        start_time: start.into(),
        show_date: start.date_naive(),
        ..future_showtime(id, 3)
    }
}

fn booking_for(id: i32, user_id: i32, showtime_id: i32, seats: &str) -> booking::Model {
    booking::Model {
        id,
        user_id,
        showtime_id,
        seats: seats.to_string(),
        total_price: 25.0,
        created_at: Utc::now().into(),
    }
}

#[tokio::test]
async fn test_showtimes_for_date_return_page_with_movie() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[BTreeMap::from([("num_items", Value::BigInt(Some(1)))])]])
        .append_query_results([vec![(future_showtime(4, 3), sample_movie(3))]])
        .into_connection();

    let response = app(db)
        .oneshot(request(
            Method::GET,
            "/api/showtime?show_date=2030-01-01&page=1&limit=5",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["showtime_id"], 4);
    assert_eq!(body["data"][0]["movie"]["title"], "Inside Out 2");
    assert_eq!(
        body["pagination"],
        json!({ "total": 1, "currentPage": 1, "totalPages": 1, "perPage": 5 })
    );
}

#[tokio::test]
async fn test_showtimes_reject_page_past_offset_range() {
    let response = app(empty_db())
        .oneshot(request(
            Method::GET,
            "/api/showtime?page=9223372036854775807&limit=100",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Page is out of range.");
}

#[tokio::test]
async fn test_seat_map_lists_booked_seats_in_order() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![future_showtime(4, 3)]])
        .append_query_results([vec![
            booking_for(1, 5, 4, "B2,A1"),
            booking_for(2, 6, 4, "C3"),
        ]])
        .into_connection();

    let response = app(db)
        .oneshot(request(Method::GET, "/api/showtime/4/seats", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["showtime_id"], 4);
    assert_eq!(body["booked_seats"], json!(["A1", "B2", "C3"]));
    assert_eq!(body["layout"]["columns"], 13);
    assert_eq!(body["layout"]["rows"][0], "G");
}

// ============ Admin Session ============

fn admin_account() -> admin::Model {
    admin::Model {
        id: 1,
        email: "admin@example.com".to_string(),
        password: hash_password("correct-horse").unwrap(),
        role: "admin".to_string(),
    }
}

#[tokio::test]
async fn test_admin_login_rejects_wrong_password() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![admin_account()]])
        .into_connection();

    let payload = json!({ "email": "admin@example.com", "password": "wrong-horse" });
    let response = app(db)
        .oneshot(request(Method::POST, "/api/admin/login", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_admin_login_sets_cookie() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![admin_account()]])
        .into_connection();

    let payload = json!({ "email": "admin@example.com", "password": "correct-horse" });
    let response = app(db)
        .oneshot(request(Method::POST, "/api/admin/login", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=3600"));
    assert_eq!(body_json(response).await["message"], "Login successful");
}

#[tokio::test]
async fn test_admin_login_requires_fields() {
    let response = app(empty_db())
        .oneshot(request(Method::POST, "/api/admin/login", Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_login_get_is_method_not_allowed() {
    let response = app(empty_db())
        .oneshot(request(Method::GET, "/api/admin/login", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn test_dashboard_redirects_without_token() {
    let response = app(empty_db())
        .oneshot(request(Method::GET, "/admin/dashboard", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/admin/login");
}

#[tokio::test]
async fn test_unknown_admin_page_redirects_without_token() {
    let response = app(empty_db())
        .oneshot(request(Method::GET, "/admin/reports/2024", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/admin/login");
}

#[tokio::test]
async fn test_unknown_admin_page_is_not_found_for_admin() {
    let req = with_header(
        request(Method::GET, "/admin/reports", None),
        header::COOKIE,
        &admin_cookie(),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_logout_clears_cookie() {
    let req = with_header(
        request(Method::POST, "/api/admin/logout", None),
        header::COOKIE,
        &admin_cookie(),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("token=;"), "{cookie}");
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
    assert_eq!(body_json(response).await["message"], "Logged out");
}

#[tokio::test]
async fn test_admin_login_page_is_public() {
    let response = app(empty_db())
        .oneshot(request(Method::GET, "/admin/login", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_token_does_not_open_admin_api() {
    let req = with_header(
        request(Method::GET, "/api/admin/bookings", None),
        header::COOKIE,
        &format!(
            "token={}",
            create_session_token(&sample_user(), ProviderKind::Credentials, SESSION_SECRET, 1)
                .unwrap()
        ),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============ User Routes ============

#[tokio::test]
async fn test_booking_requires_session() {
    let payload = json!({ "showtimeId": 1, "seats": ["A1"], "totalPrice": 12.5 });
    let response = app(empty_db())
        .oneshot(request(Method::POST, "/api/booking", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_rejects_unknown_seat() {
    let payload = json!({ "showtimeId": 1, "seats": ["A1", "Z99"], "totalPrice": 25.0 });
    let req = with_header(
        request(Method::POST, "/api/booking", Some(payload)),
        header::AUTHORIZATION,
        &bearer(&sample_user()),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid seat: Z99");
}

#[tokio::test]
async fn test_booking_requires_all_fields() {
    let req = with_header(
        request(Method::POST, "/api/booking", Some(json!({ "seats": ["A1"] }))),
        header::AUTHORIZATION,
        &bearer(&sample_user()),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "All fields are required");
}

#[tokio::test]
async fn test_booking_created_for_free_seats() {
    let user = sample_user();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![future_showtime(4, 3)]])
        .append_query_results([vec![booking_for(1, 6, 4, "C3")]])
        .append_query_results([vec![booking_for(21, user.id, 4, "A1,A2")]])
        .append_exec_results([MockExecResult {
            last_insert_id: 21,
            rows_affected: 1,
        }])
        .into_connection();

    let payload = json!({ "showtimeId": 4, "seats": "a1, A2", "totalPrice": 25.0 });
    let req = with_header(
        request(Method::POST, "/api/booking", Some(payload)),
        header::AUTHORIZATION,
        &bearer(&user),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], 21);
    assert_eq!(body["userId"], user.id);
    assert_eq!(body["seats"], json!(["A1", "A2"]));
    assert_eq!(body["totalPrice"], 25.0);
}

#[tokio::test]
async fn test_booking_taken_seat_is_conflict() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![future_showtime(4, 3)]])
        .append_query_results([vec![booking_for(1, 6, 4, "A1,A2")]])
        .into_connection();

    let payload = json!({ "showtimeId": 4, "seats": ["B3", "a2"], "totalPrice": 25.0 });
    let req = with_header(
        request(Method::POST, "/api/booking", Some(payload)),
        header::AUTHORIZATION,
        &bearer(&sample_user()),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Seats already booked: A2");
}

#[tokio::test]
async fn test_cancel_other_users_booking_is_forbidden() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![booking_for(9, 77, 4, "A1")]])
        .into_connection();

    let req = with_header(
        request(Method::DELETE, "/api/booking/9", None),
        header::AUTHORIZATION,
        &bearer(&sample_user()),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"],
        "You can only cancel your own bookings"
    );
}

#[tokio::test]
async fn test_cancel_after_showtime_started_is_rejected() {
    let user = sample_user();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![booking_for(9, user.id, 4, "A1")]])
        .append_query_results([vec![past_showtime(4)]])
        .into_connection();

    let req = with_header(
        request(Method::DELETE, "/api/booking/9", None),
        header::AUTHORIZATION,
        &bearer(&user),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Cannot cancel a booking after the showtime has started"
    );
}

#[tokio::test]
async fn test_favorite_toggle_adds_movie() {
    let user = sample_user();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_movie(3)]])
        .append_query_results([Vec::<favorite::Model>::new()])
        .append_query_results([vec![favorite::Model {
            id: 11,
            user_id: user.id,
            movie_id: 3,
            created_at: Utc::now().into(),
        }]])
        .append_exec_results([MockExecResult {
            last_insert_id: 11,
            rows_affected: 1,
        }])
        .into_connection();

    let req = with_header(
        request(Method::POST, "/api/favorite", Some(json!({ "movieId": 3 }))),
        header::AUTHORIZATION,
        &bearer(&user),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "isFavorite": true }));
}

#[tokio::test]
async fn test_favorite_toggle_removes_existing() {
    let user = sample_user();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_movie(3)]])
        .append_query_results([vec![favorite::Model {
            id: 11,
            user_id: user.id,
            movie_id: 3,
            created_at: Utc::now().into(),
        }]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let req = with_header(
        request(Method::POST, "/api/favorite", Some(json!({ "movieId": 3 }))),
        header::AUTHORIZATION,
        &bearer(&user),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "isFavorite": false }));
}

#[tokio::test]
async fn test_favorite_unknown_movie_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<movie::Model>::new()])
        .into_connection();

    let req = with_header(
        request(Method::POST, "/api/favorite", Some(json!({ "movieId": 404 }))),
        header::AUTHORIZATION,
        &bearer(&sample_user()),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_content_length_is_checked() {
    let payload = json!({ "movieId": 1, "content": "x".repeat(1001) });
    let req = with_header(
        request(Method::POST, "/api/comments", Some(payload)),
        header::AUTHORIZATION,
        &bearer(&sample_user()),
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============ Auth ============

#[tokio::test]
async fn test_signup_validation_reports_fields() {
    let payload = json!({
        "name": "J",
        "username": "jr",
        "email": "not-an-email",
        "password": "short"
    });
    let response = app(empty_db())
        .oneshot(request(Method::POST, "/api/auth/signup", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["details"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_signup_creates_user() {
    let user = sample_user();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .append_query_results([vec![user.clone()]])
        .append_query_results([vec![auth_provider::Model {
            id: 1,
            user_id: user.id,
            provider: ProviderKind::Credentials,
            provider_id: None,
            password: Some("hash".to_string()),
        }]])
        .into_connection();

    let payload = json!({
        "name": "Jamie Rivera",
        "username": "jrivera",
        "email": "jamie@example.com",
        "password": "long-enough-password"
    });
    let response = app(db)
        .oneshot(request(Method::POST, "/api/auth/signup", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "message": "User created successfully" })
    );
}

#[tokio::test]
async fn test_signup_missing_fields_report_details() {
    let response = app(empty_db())
        .oneshot(request(Method::POST, "/api/auth/signup", Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid input");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["name", "username", "email", "password"]);
}

#[tokio::test]
async fn test_signup_rejects_duplicate_user() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user()]])
        .into_connection();

    let payload = json!({
        "name": "Jamie Rivera",
        "username": "jrivera",
        "email": "jamie@example.com",
        "password": "long-enough-password"
    });
    let response = app(db)
        .oneshot(request(Method::POST, "/api/auth/signup", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "User with this email or username already exists."
    );
}

#[tokio::test]
async fn test_login_unknown_email_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let payload = json!({ "email": "ghost@example.com", "password": "whatever123" });
    let response = app(db)
        .oneshot(request(Method::POST, "/api/auth/login", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_otp_request_unknown_phone_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let response = app(db)
        .oneshot(request(
            Method::POST,
            "/api/auth/otp/request",
            Some(json!({ "phone_number": "+15559999" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn otp_for(phone_number: &str, code: &str, consumed: bool) -> otp_code::Model {
    otp_code::Model {
        id: 3,
        phone_number: phone_number.to_string(),
        code_hash: hex::encode(Sha256::digest(format!("{}:{}", phone_number, code).as_bytes())),
        expires_at: (Utc::now() + Duration::minutes(5)).into(),
        consumed,
    }
}

fn verify_request(otp: &str) -> Request<Body> {
    request(
        Method::POST,
        "/api/auth/otp/verify",
        Some(json!({ "phone_number": "+15550100", "otp": otp })),
    )
}

#[tokio::test]
async fn test_otp_verify_consumes_live_code() {
    let user = sample_user();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![otp_for("+15550100", "123456", false)]])
        .append_query_results([vec![otp_for("+15550100", "123456", true)]])
        .append_query_results([vec![user.clone()]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let response = app(db).oneshot(verify_request("123456")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["username"], "jrivera");
}

#[tokio::test]
async fn test_otp_verify_without_live_code_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<otp_code::Model>::new()])
        .into_connection();

    let response = app(db).oneshot(verify_request("123456")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid OTP.");
}

#[tokio::test]
async fn test_otp_verify_wrong_code_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![otp_for("+15550100", "123456", false)]])
        .into_connection();

    let response = app(db).oneshot(verify_request("654321")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_otp_verify_accepts_dev_code() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user()]])
        .into_connection();
    let config = Config {
        otp_dev_code: Some("000000".to_string()),
        ..test_config()
    };

    let response = app_with(db, config)
        .oneshot(verify_request("000000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["username"], "jrivera");
}

#[tokio::test]
async fn test_session_returns_current_user() {
    let user = sample_user();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user.clone()]])
        .into_connection();

    let req = with_header(
        request(Method::GET, "/api/auth/session", None),
        header::AUTHORIZATION,
        &bearer(&user),
    );
    let response = app(db).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "jrivera");
    assert_eq!(body["provider"], "credentials");
}

#[tokio::test]
async fn test_oauth_state_mismatch_is_unauthorized() {
    let req = with_header(
        request(
            Method::GET,
            "/api/auth/oauth/google/callback?code=abc&state=forged",
            None,
        ),
        header::COOKIE,
        "oauth_state=expected",
    );
    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oauth_unknown_provider_is_not_found() {
    let response = app(empty_db())
        .oneshot(request(Method::GET, "/api/auth/oauth/myspace", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============ Subscribe & Uploads ============

#[tokio::test]
async fn test_subscribe_rejects_invalid_email() {
    let response = app(empty_db())
        .oneshot(request(
            Method::POST,
            "/api/subscribe",
            Some(json!({ "email": "nobody" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "success": false, "message": "Invalid email address" })
    );
}

#[tokio::test]
async fn test_subscribe_without_list_fails() {
    let response = app(empty_db())
        .oneshot(request(
            Method::POST,
            "/api/subscribe",
            Some(json!({ "email": "fan@example.com" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "Failed to subscribe");
}

#[tokio::test]
async fn test_upload_without_storage_is_server_error() {
    let boundary = "XBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"poster.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nJPEGDATA\r\n--{b}--\r\n",
        b = boundary
    );

    let mut req = Request::builder()
        .method(Method::POST)
        .uri("/api/admin/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header(header::COOKIE, admin_cookie())
        .body(Body::from(body))
        .unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    let response = app(empty_db()).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
