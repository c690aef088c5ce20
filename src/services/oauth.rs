//! Authorization-code flow against Google and Facebook.

use std::str::FromStr;

use reqwest::Client;
use serde::Deserialize;

use crate::config::{Config, OAuthClientConfig};
use crate::entities::auth_provider::ProviderKind;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Facebook,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Facebook => "facebook",
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            OAuthProvider::Google => ProviderKind::Google,
            OAuthProvider::Facebook => ProviderKind::Facebook,
        }
    }
}

impl FromStr for OAuthProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(OAuthProvider::Google),
            "facebook" => Ok(OAuthProvider::Facebook),
            other => Err(AppError::NotFound(format!("Unknown OAuth provider: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl ProviderEndpoints {
    fn defaults(provider: OAuthProvider) -> Self {
        match provider {
            OAuthProvider::Google => Self {
                authorize: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token: "https://oauth2.googleapis.com/token".to_string(),
                userinfo: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            },
            OAuthProvider::Facebook => Self {
                authorize: "https://www.facebook.com/v19.0/dialog/oauth".to_string(),
                token: "https://graph.facebook.com/v19.0/oauth/access_token".to_string(),
                userinfo: "https://graph.facebook.com/me".to_string(),
            },
        }
    }
}

/// Identity returned by a provider after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookUserInfo {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Clone)]
struct ProviderClient {
    credentials: OAuthClientConfig,
    endpoints: ProviderEndpoints,
}

#[derive(Clone)]
pub struct OAuthClient {
    http: Client,
    public_base_url: String,
    google: Option<ProviderClient>,
    facebook: Option<ProviderClient>,
}

impl OAuthClient {
    pub fn new(http: Client, config: &Config) -> Self {
        let client = |provider, credentials: &Option<OAuthClientConfig>| {
            credentials.clone().map(|credentials| ProviderClient {
                credentials,
                endpoints: ProviderEndpoints::defaults(provider),
            })
        };

        Self {
            http,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            google: client(OAuthProvider::Google, &config.google),
            facebook: client(OAuthProvider::Facebook, &config.facebook),
        }
    }

    pub fn with_endpoints(mut self, provider: OAuthProvider, endpoints: ProviderEndpoints) -> Self {
        let slot = match provider {
            OAuthProvider::Google => &mut self.google,
            OAuthProvider::Facebook => &mut self.facebook,
        };
        if let Some(client) = slot.as_mut() {
            client.endpoints = endpoints;
        }
        self
    }

    fn provider(&self, provider: OAuthProvider) -> AppResult<&ProviderClient> {
        let client = match provider {
            OAuthProvider::Google => self.google.as_ref(),
            OAuthProvider::Facebook => self.facebook.as_ref(),
        };
        client.ok_or_else(|| {
            AppError::NotFound(format!("{} sign-in is not configured", provider.as_str()))
        })
    }

    pub fn redirect_uri(&self, provider: OAuthProvider) -> String {
        format!(
            "{}/api/auth/oauth/{}/callback",
            self.public_base_url,
            provider.as_str()
        )
    }

    pub fn authorization_url(&self, provider: OAuthProvider, state: &str) -> AppResult<String> {
        let client = self.provider(provider)?;
        let redirect_uri = self.redirect_uri(provider);
        let scope = match provider {
            OAuthProvider::Google => "openid email profile",
            OAuthProvider::Facebook => "email public_profile",
        };

        let url = url::Url::parse_with_params(
            &client.endpoints.authorize,
            &[
                ("client_id", client.credentials.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build URL: {}", e)))?;

        Ok(url.to_string())
    }

    /// Exchange an authorization code and fetch the signed-in profile.
    pub async fn fetch_profile(&self, provider: OAuthProvider, code: &str) -> AppResult<OAuthProfile> {
        let client = self.provider(provider)?;
        let redirect_uri = self.redirect_uri(provider);
        let params = [
            ("code", code),
            ("client_id", client.credentials.client_id.as_str()),
            ("client_secret", client.credentials.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let request = match provider {
            OAuthProvider::Google => self.http.post(&client.endpoints.token).form(&params),
            OAuthProvider::Facebook => self.http.get(&client.endpoints.token).query(&params),
        };
        let token: TokenResponse = send_json(request, "token exchange").await?;

        match provider {
            OAuthProvider::Google => {
                let info: GoogleUserInfo = send_json(
                    self.http
                        .get(&client.endpoints.userinfo)
                        .bearer_auth(&token.access_token),
                    "userinfo",
                )
                .await?;
                Ok(OAuthProfile {
                    provider_id: info.sub,
                    email: info.email,
                    name: info.name,
                })
            }
            OAuthProvider::Facebook => {
                let info: FacebookUserInfo = send_json(
                    self.http.get(&client.endpoints.userinfo).query(&[
                        ("fields", "id,name,email"),
                        ("access_token", token.access_token.as_str()),
                    ]),
                    "userinfo",
                )
                .await?;
                Ok(OAuthProfile {
                    provider_id: info.id,
                    email: info.email,
                    name: info.name,
                })
            }
        }
    }
}

async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    step: &str,
) -> AppResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("OAuth {} failed: {}", step, e)))?;

    let status = response.status();
    if status.is_client_error() {
        // Expired or replayed codes land here
        return Err(AppError::Unauthorized(format!("OAuth {} rejected", step)));
    }
    if !status.is_success() {
        return Err(AppError::Upstream(format!("OAuth {} returned {}", step, status)));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AppError::Upstream(format!("Malformed OAuth {} response: {}", step, e)))
}
