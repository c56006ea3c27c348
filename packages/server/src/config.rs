use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_ttl_hours: i64,
    /// Root directory for uploaded FILE/IMAGE sources
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    /// CORS allow-list; empty allows any origin
    pub allowed_origins: Vec<String>,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            port: parse_or("PORT", 8080)?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "research-vault".to_string()),
            jwt_ttl_hours: ttl_hours(parse_or("JWT_TTL_HOURS", 24)?)?,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            allowed_origins: parse_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            rate_limit_per_second: parse_or("RATE_LIMIT_PER_SECOND", 10)?,
            rate_limit_burst: parse_or("RATE_LIMIT_BURST", 20)?,
        })
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset
fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        _ => Ok(default),
    }
}

/// Token lifetime must be between one hour and a year
const MAX_JWT_TTL_HOURS: i64 = 24 * 365;

fn ttl_hours(hours: i64) -> Result<i64> {
    if !(1..=MAX_JWT_TTL_HOURS).contains(&hours) {
        anyhow::bail!(
            "JWT_TTL_HOURS must be between 1 and {}, got {}",
            MAX_JWT_TTL_HOURS,
            hours
        );
    }
    Ok(hours)
}

/// Comma-separated origins, blanks dropped
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert!(parse_origins("").is_empty());
        assert_eq!(
            parse_origins("http://localhost:3000, https://vault.example.com,"),
            vec!["http://localhost:3000", "https://vault.example.com"]
        );
    }

    #[test]
    fn test_ttl_hours_bounds() {
        assert_eq!(ttl_hours(24).unwrap(), 24);
        assert_eq!(ttl_hours(MAX_JWT_TTL_HOURS).unwrap(), MAX_JWT_TTL_HOURS);

        for bad in [0, -5, MAX_JWT_TTL_HOURS + 1, i64::MAX] {
            let err = ttl_hours(bad).unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_HOURS"));
        }
    }
}
