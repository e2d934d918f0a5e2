use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitConfig,
    pub swagger: SwaggerConfig,
}

/// Runtime mode reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(format!(
                "APP_ENV must be one of development, production, test (got '{}')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    /// Take the client address from `X-Forwarded-For` when running behind a proxy
    pub trust_proxy: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// S3-compatible object storage configuration for report media
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// AWS region (also used as the signing region for custom endpoints)
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Custom S3-compatible endpoint (MinIO, LocalStack). Enables path-style URLs.
    pub endpoint: Option<String>,
    /// Base URL used to build public file locations, e.g. a CDN in front of the bucket
    pub public_url: Option<String>,
}

/// One rate limit policy: at most `max_requests` per sliding `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicyConfig {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Every `/api/*` request
    pub api: RateLimitPolicyConfig,
    /// Report submission (multipart uploads)
    pub upload: RateLimitPolicyConfig,
    /// Business creation
    pub create: RateLimitPolicyConfig,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

fn required(name: &str) -> Result<String, String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(format!("{} environment variable is required", name)),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match optional(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", name)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl AppConfig {
    const DEFAULT_PORT: u16 = 4000;
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = optional("PORT")
            .map(|p| {
                p.parse::<u16>()
                    .map_err(|e| format!("Invalid PORT: {}", e))
            })
            .transpose()?
            .unwrap_or(Self::DEFAULT_PORT);

        let environment = optional("APP_ENV")
            .map(|s| s.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();

        let cors_allowed_origins = optional("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = parse_or(
            "MAX_REQUEST_BODY_SIZE",
            Self::DEFAULT_MAX_REQUEST_BODY_SIZE,
        )?;

        let trust_proxy = optional("TRUST_PROXY")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            environment,
            cors_allowed_origins,
            max_request_body_size,
            trust_proxy,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = required("DATABASE_URL")?;
        validate_database_url(&url)?;

        Ok(Self {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_or("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_or("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_or("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

fn validate_database_url(url: &str) -> Result<(), String> {
    let rest = url
        .strip_prefix("postgres://")
        .or_else(|| url.strip_prefix("postgresql://"))
        .ok_or_else(|| "DATABASE_URL must be a postgres:// or postgresql:// URL".to_string())?;

    if rest.is_empty() {
        return Err("DATABASE_URL is missing a host".to_string());
    }
    Ok(())
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint = optional("AWS_ENDPOINT").map(|e| e.trim_end_matches('/').to_string());
        let public_url = optional("AWS_PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string());

        Ok(Self {
            region: required("AWS_REGION")?,
            access_key: required("AWS_ACCESS_KEY_ID")?,
            secret_key: required("AWS_SECRET_ACCESS_KEY")?,
            bucket: required("AWS_BUCKET_NAME")?,
            endpoint,
            public_url,
        })
    }
}

impl RateLimitPolicyConfig {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    fn from_env(prefix: &str, default: Self) -> Result<Self, String> {
        let max_requests = parse_or(&format!("{}_MAX", prefix), default.max_requests)?;
        let window_secs = parse_or(&format!("{}_WINDOW_SECS", prefix), default.window.as_secs())?;

        if max_requests == 0 || window_secs == 0 {
            return Err(format!(
                "{}_MAX and {}_WINDOW_SECS must be greater than zero",
                prefix, prefix
            ));
        }

        Ok(Self::new(max_requests, window_secs))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            api: RateLimitPolicyConfig::new(100, 15 * 60),
            upload: RateLimitPolicyConfig::new(10, 15 * 60),
            create: RateLimitPolicyConfig::new(5, 60 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            api: RateLimitPolicyConfig::from_env("RATE_LIMIT_API", defaults.api)?,
            upload: RateLimitPolicyConfig::from_env("RATE_LIMIT_UPLOAD", defaults.upload)?,
            create: RateLimitPolicyConfig::from_env("RATE_LIMIT_CREATE", defaults.create)?,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            username: optional("SWAGGER_USERNAME"),
            password: optional("SWAGGER_PASSWORD"),
            title: optional("SWAGGER_TITLE").unwrap_or_else(|| "OvaSight API".to_string()),
            version: optional("SWAGGER_VERSION").unwrap_or_else(|| "0.1.0".to_string()),
            description: optional("SWAGGER_DESCRIPTION")
                .unwrap_or_else(|| "Business daily reporting API".to_string()),
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
