pub mod admin;
pub mod auth_provider;
pub mod booking;
pub mod cinema;
pub mod comment;
pub mod favorite;
pub mod movie;
pub mod otp_code;
pub mod showtime;
pub mod user;
