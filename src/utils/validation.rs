use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

use crate::error::{AppError, AppResult, FieldError};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email regex compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Absolute http(s) URL.
pub fn is_valid_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len < min {
            let message = if min == 1 {
                format!("{} is required", field)
            } else {
                format!("{} must be at least {} characters", field, min)
            };
            self.errors.push(FieldError::new(field, message));
        } else if len > max {
            self.errors.push(FieldError::new(
                field,
                format!("{} must be at most {} characters", field, max),
            ));
        }
        self
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(is_valid_email(value), field, "Invalid email format")
    }

    pub fn url(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(is_valid_url(value), field, "Invalid URL")
    }

    pub fn date(&mut self, field: &'static str, value: &str) -> Option<NaiveDate> {
        let parsed = parse_date(value);
        self.check(parsed.is_some(), field, "Invalid date format");
        parsed
    }

    pub fn finish(&mut self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
