//! Poster uploads to S3, signed with AWS Signature Version 4.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::config::S3Config;
use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "s3";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-amz-content-sha256;x-amz-date";

#[derive(Clone)]
pub struct S3Storage {
    http: Client,
    config: S3Config,
    endpoint: String,
}

impl S3Storage {
    pub fn new(http: Client, config: S3Config) -> Self {
        let endpoint = format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region);
        Self {
            http,
            config,
            endpoint,
        }
    }

    /// Send requests somewhere other than AWS (S3-compatible stores, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Public URL of an object key.
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.config.bucket, self.config.region, key
        )
    }

    /// Store `body` under `key` and return its public URL.
    pub async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> AppResult<String> {
        let url = url::Url::parse(&format!("{}/{}", self.endpoint, uri_encode(key, false)))
            .map_err(|e| AppError::Internal(format!("Invalid storage endpoint: {}", e)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            _ => return Err(AppError::Internal("Storage endpoint has no host".to_string())),
        };

        let now = Utc::now();
        let payload_hash = hex::encode(Sha256::digest(&body));
        let authorization = self.authorization(
            url.path(),
            &host,
            content_type,
            &payload_hash,
            now,
        )?;

        let response = self
            .http
            .put(url)
            .header("authorization", authorization)
            .header("content-type", content_type)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", amz_date(now))
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("S3 request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("S3 returned {}: {}", status, detail)));
        }

        let file_uri = self.object_url(key);
        tracing::info!(key = %key, uri = %file_uri, "Uploaded file");
        Ok(file_uri)
    }

    fn authorization(
        &self,
        canonical_uri: &str,
        host: &str,
        content_type: &str,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let amz_date = amz_date(now);
        let date_stamp = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/aws4_request", date_stamp, self.config.region, SERVICE);

        let canonical_request = format!(
            "PUT\n{}\n\ncontent-type:{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            canonical_uri, content_type, host, payload_hash, amz_date, SIGNED_HEADERS, payload_hash
        );

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = signing_key(
            &self.config.secret_access_key,
            &date_stamp,
            &self.config.region,
            SERVICE,
        )?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.config.access_key_id, scope, SIGNED_HEADERS, signature
        ))
    }
}

fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> AppResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> AppResult<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// RFC 3986 percent-encoding as SigV4 expects it; `/` is kept unless `encode_slash`.
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Object key for an uploaded poster: `uploads/{uuid}-{sanitized name}`.
pub fn upload_key(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches('-');
    let name = if sanitized.is_empty() { "file" } else { sanitized };

    format!("uploads/{}-{}", uuid::Uuid::new_v4(), name)
}
