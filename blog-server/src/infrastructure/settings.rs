use anyhow::{Context, Result, anyhow};

use super::jwt::JwtService;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const MIN_JWT_SECRET_CHARS: usize = 32;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,
    pub http_addr: String,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub log_level: String,
    pub http_request_body_limit_bytes: usize,
    pub http_concurrency_limit: usize,
    pub http_request_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            get_required(&lookup, "DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt_secret = get_required(&lookup, "JWT_SECRET").context("JWT_SECRET is required")?;
        if jwt_secret.chars().count() < MIN_JWT_SECRET_CHARS {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        let jwt_ttl_seconds: i64 = lookup("JWT_TTL_SECONDS")
            .unwrap_or_else(|| JwtService::DEFAULT_TTL_SECONDS.to_string())
            .parse()
            .context("Failed to parse JWT_TTL_SECONDS, expecting integer")?;
        if jwt_ttl_seconds > JwtService::MAX_TTL_SECONDS {
            return Err(anyhow!(
                "JWT_TTL_SECONDS must be at most {}",
                JwtService::MAX_TTL_SECONDS
            ));
        }

        let http_addr = match lookup("HTTP_ADDR") {
            Some(addr) => addr,
            None => {
                let port: u16 = lookup("PORT")
                    .unwrap_or_else(|| DEFAULT_PORT.to_string())
                    .parse()
                    .context("Failed to parse PORT, expecting a port number")?;
                format!("0.0.0.0:{port}")
            }
        };

        let cors_origins = parse_cors_origins(
            lookup("CORS_ORIGINS")
                .or_else(|| lookup("CLIENT_URL"))
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
        );
        let environment = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        let database_max_connections =
            parse_positive_env(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let http_request_body_limit_bytes =
            parse_positive_env(&lookup, "HTTP_REQUEST_BODY_LIMIT_BYTES", 10 * 1024 * 1024usize)?;
        let http_concurrency_limit = parse_positive_env(&lookup, "HTTP_CONCURRENCY_LIMIT", 256usize)?;
        let http_request_timeout_secs =
            parse_positive_env(&lookup, "HTTP_REQUEST_TIMEOUT_SECS", 10u64)?;

        Ok(Self {
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_ttl_seconds,
            http_addr,
            cors_origins,
            environment,
            log_level,
            http_request_body_limit_bytes,
            http_concurrency_limit,
            http_request_timeout_secs,
        })
    }
}

fn get_required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| anyhow!("{key} is not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_cors_origins(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_positive_env<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?,
        None => default,
    };

    if value == T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
