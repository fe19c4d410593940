use std::env;
use thiserror::Error;

const DEV_SECRET: &str = "formation-local-development-secret";
const DEFAULT_DB: &str = "formation";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TOKEN_EXPIRATION: i64 = 7200;

/// ConfigError
///
/// Startup configuration failures. `main` refuses to boot on any of these.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// AppConfig
///
/// The immutable configuration shared by every service. Pulled into handlers
/// and extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Runtime environment. Controls the `x-user-id` bypass and log format.
    pub env: Env,
    /// MongoDB connection string. `None` selects the in-memory repository (local only).
    pub mongodb_uri: Option<String>,
    /// Database used when the URI names none.
    pub mongodb_db: String,
    /// Signs and verifies session tokens.
    pub payload_secret: String,
    pub port: u16,
    /// Token lifetime in seconds.
    pub token_expiration: i64,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    pub s3_bucket: String,
    /// Base URL for public media links; defaults to `{endpoint}/{bucket}`.
    pub s3_public_url: Option<String>,
}

/// Env
///
/// Runtime context: `Local` enables development conveniences (MinIO bucket
/// creation, header bypass, in-memory store), `Production` hardens everything.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Local configuration with no database, for tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            mongodb_uri: None,
            mongodb_db: DEFAULT_DB.to_string(),
            payload_secret: DEV_SECRET.to_string(),
            port: DEFAULT_PORT,
            token_expiration: DEFAULT_TOKEN_EXPIRATION,
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "formation-media".to_string(),
            s3_public_url: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the process environment. Production fails
    /// fast when a secret or the database URI is missing; local mode falls back
    /// to MinIO defaults and a development secret.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };
        let defaults = Self::default();

        let port = match optional("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => defaults.port,
        };

        let token_expiration = match optional("TOKEN_EXPIRATION") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(seconds) if seconds > 0 => seconds,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "TOKEN_EXPIRATION",
                        value: raw,
                    });
                }
            },
            None => defaults.token_expiration,
        };

        let mongodb_db = optional("MONGODB_DB").unwrap_or(defaults.mongodb_db);
        let s3_public_url = optional("S3_PUBLIC_URL");

        match env {
            Env::Local => Ok(Self {
                env,
                mongodb_uri: optional("MONGODB_URI"),
                mongodb_db,
                payload_secret: optional("PAYLOAD_SECRET").unwrap_or(defaults.payload_secret),
                port,
                token_expiration,
                s3_endpoint: optional("S3_ENDPOINT").unwrap_or(defaults.s3_endpoint),
                s3_region: optional("S3_REGION").unwrap_or(defaults.s3_region),
                s3_key: optional("S3_ACCESS_KEY").unwrap_or(defaults.s3_key),
                s3_secret: optional("S3_SECRET_KEY").unwrap_or(defaults.s3_secret),
                s3_bucket: optional("S3_BUCKET_NAME").unwrap_or(defaults.s3_bucket),
                s3_public_url,
            }),
            Env::Production => Ok(Self {
                env,
                mongodb_uri: Some(required("MONGODB_URI")?),
                mongodb_db,
                payload_secret: required("PAYLOAD_SECRET")?,
                port,
                token_expiration,
                s3_endpoint: optional("S3_ENDPOINT").unwrap_or(defaults.s3_endpoint),
                s3_region: optional("S3_REGION").unwrap_or(defaults.s3_region),
                s3_key: required("S3_ACCESS_KEY")?,
                s3_secret: required("S3_SECRET_KEY")?,
                s3_bucket: optional("S3_BUCKET_NAME").unwrap_or(defaults.s3_bucket),
                s3_public_url,
            }),
        }
    }
}

/// Blank values count as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}
