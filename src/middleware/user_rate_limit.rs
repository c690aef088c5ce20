use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::KeyExtractor,
    GovernorError, GovernorLayer,
};

use crate::middleware::rate_limit::rate_limit_error_handler;
use crate::utils::jwt::SessionClaims;

/// Keys the limiter on the user id from session claims in request extensions
#[derive(Debug, Clone, Copy)]
pub struct SessionUserExtractor;

impl KeyExtractor for SessionUserExtractor {
    type Key = i32;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        // Set by user_auth, which must run first
        let claims = req
            .extensions()
            .get::<SessionClaims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type UserGovernorLayer = GovernorLayer<
    SessionUserExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Per-user limit on signed-in routes: 120 requests per minute, one token every 500ms
pub fn create_user_governor() -> UserGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(500)
            .burst_size(120)
            .key_extractor(SessionUserExtractor)
            .finish()
            .expect("user governor config is valid"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}
