pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::newsletter::MailchimpClient;
use services::oauth::OAuthClient;
use services::storage::S3Storage;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Config,
    pub storage: Option<S3Storage>,
    pub newsletter: Option<MailchimpClient>,
    pub oauth: OAuthClient,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let http = reqwest::Client::new();

        Self {
            storage: config
                .s3
                .clone()
                .map(|s3| S3Storage::new(http.clone(), s3)),
            newsletter: config
                .mailchimp
                .clone()
                .map(|mc| MailchimpClient::new(http.clone(), mc)),
            oauth: OAuthClient::new(http, &config),
            db: Arc::new(db),
            config,
        }
    }
}
