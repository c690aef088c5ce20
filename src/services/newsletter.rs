use reqwest::Client;
use serde::Serialize;

use crate::config::MailchimpConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct MemberRequest<'a> {
    email_address: &'a str,
    status: &'a str,
}

/// Adds addresses to a Mailchimp audience list.
#[derive(Clone)]
pub struct MailchimpClient {
    http: Client,
    config: MailchimpConfig,
    base_url: String,
}

impl MailchimpClient {
    pub fn new(http: Client, config: MailchimpConfig) -> Self {
        let base_url = format!("https://{}.api.mailchimp.com", config.datacenter);
        Self {
            http,
            config,
            base_url,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn subscribe(&self, email: &str) -> AppResult<()> {
        let url = format!(
            "{}/3.0/lists/{}/members/",
            self.base_url, self.config.list_id
        );

        let response = self
            .http
            .post(&url)
            .basic_auth("anystring", Some(&self.config.api_key))
            .json(&MemberRequest {
                email_address: email,
                status: "subscribed",
            })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Mailchimp request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, response = %detail, "Mailchimp rejected subscription");
            return Err(AppError::Upstream(format!("Mailchimp returned {}", status)));
        }

        Ok(())
    }
}
