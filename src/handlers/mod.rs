pub mod admin;
pub mod auth;
pub mod bookings;
pub mod cinemas;
pub mod comments;
pub mod favorites;
pub mod movies;
pub mod oauth;
pub mod pages;
pub mod showtimes;
pub mod subscribe;
pub mod uploads;
