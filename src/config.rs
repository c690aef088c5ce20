use std::env;

#[derive(Clone, Debug)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Debug)]
pub struct S3Config {
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Clone, Debug)]
pub struct MailchimpConfig {
    pub api_key: String,
    pub list_id: String,
    pub datacenter: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub session_secret: String,
    pub session_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub production: bool,
    pub public_base_url: String,
    pub otp_ttl_minutes: i64,
    pub otp_dev_code: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub google: Option<OAuthClientConfig>,
    pub facebook: Option<OAuthClientConfig>,
    pub s3: Option<S3Config>,
    pub mailchimp: Option<MailchimpConfig>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            session_secret: env::var("SESSION_SECRET")
                .expect("SESSION_SECRET must be set"),
            session_expiration_hours: env::var("SESSION_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("SESSION_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            otp_ttl_minutes: env::var("OTP_TTL_MINUTES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("OTP_TTL_MINUTES must be a number"),
            otp_dev_code: optional("OTP_DEV_CODE"),
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
            google: oauth_client("GOOGLE"),
            facebook: oauth_client("FACEBOOK"),
            s3: match (
                optional("AWS_S3_REGION"),
                optional("AWS_S3_BUCKET_NAME"),
                optional("AWS_S3_ACCESS_KEY_ID"),
                optional("AWS_S3_SECRET_ACCESS_KEY"),
            ) {
                (Some(region), Some(bucket), Some(access_key_id), Some(secret_access_key)) => {
                    Some(S3Config {
                        region,
                        bucket,
                        access_key_id,
                        secret_access_key,
                    })
                }
                _ => None,
            },
            mailchimp: match (
                optional("MAILCHIMP_API_KEY"),
                optional("MAILCHIMP_LIST_ID"),
                optional("MAILCHIMP_DATACENTER"),
            ) {
                (Some(api_key), Some(list_id), Some(datacenter)) => Some(MailchimpConfig {
                    api_key,
                    list_id,
                    datacenter,
                }),
                _ => None,
            },
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse()
                .expect("MAX_UPLOAD_BYTES must be a number"),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn oauth_client(prefix: &str) -> Option<OAuthClientConfig> {
    let client_id = optional(&format!("{}_CLIENT_ID", prefix))?;
    let client_secret = optional(&format!("{}_CLIENT_SECRET", prefix))?;
    Some(OAuthClientConfig {
        client_id,
        client_secret,
    })
}
