use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Raw `page`/`limit` query values; parsed by hand so bad input maps to our JSON 400.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    /// Page and limit are both >= 1; the row offset must fit a Postgres bigint.
    pub fn resolve(&self) -> AppResult<PageWindow> {
        let page = parse_positive(self.page.as_deref(), DEFAULT_PAGE)?;
        let limit = parse_positive(self.limit.as_deref(), DEFAULT_LIMIT)?;
        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| *offset <= i64::MAX as u64)
            .ok_or_else(|| AppError::BadRequest("Page is out of range.".to_string()))?;

        Ok(PageWindow {
            page,
            limit,
            offset,
        })
    }
}

fn parse_positive(raw: Option<&str>, default: u64) -> AppResult<u64> {
    let invalid = || AppError::BadRequest("Page and limit must be positive integers.".to_string());
    match raw {
        None => Ok(default),
        Some(s) => {
            let value: i64 = s.trim().parse().map_err(|_| invalid())?;
            if value < 1 {
                return Err(invalid());
            }
            Ok(value as u64)
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub per_page: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        Self {
            total,
            current_page: page,
            total_pages: total.div_ceil(limit),
            per_page: limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// A page of results, or a message when the filters matched nothing.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Page(Paginated<T>),
    Empty { message: String },
}

impl<T> ListResponse<T> {
    pub fn build(data: Vec<T>, total: u64, page: u64, limit: u64, empty_message: &str) -> Self {
        if data.is_empty() {
            return ListResponse::Empty {
                message: empty_message.to_string(),
            };
        }

        ListResponse::Page(Paginated {
            data,
            pagination: Pagination::new(total, page, limit),
        })
    }
}
