pub mod risk_catalog;

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub app_mode: String,
    pub store: StoreConfig,
    pub upload: UploadConfig,
    pub session: SessionConfig,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Clone, Debug)]
pub enum StoreConfig {
    Postgres(PostgresConfig),
    Memory,
}

#[derive(Clone, Debug)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub backend: UploadBackend,
    pub max_bytes: usize,
}

#[derive(Clone, Debug)]
pub enum UploadBackend {
    /// Images written under `dir` and served back under `url_prefix`.
    Local { dir: PathBuf, url_prefix: String },
    S3(S3Config),
}

#[derive(Clone, Debug)]
pub struct S3Config {
    pub endpoint: String,
    pub public_endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
}

#[derive(Clone)]
pub struct SessionConfig {
    pub key: [u8; 32],
    pub ttl_hours: u64,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("key", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;
        let app_mode = env_or("APP_MODE", "api");

        let store = match env_or("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreConfig::Postgres(PostgresConfig {
                database_url: env_or_err("DATABASE_URL")?,
                max_connections: env_or_parse("DB_MAX_CONNECTIONS", "10")?,
                connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
                idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
                max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            }),
            "memory" => StoreConfig::Memory,
            other => return Err(anyhow!("unknown STORE_BACKEND: {}", other)),
        };

        let backend = match env_or("UPLOAD_BACKEND", "local").as_str() {
            "local" => {
                let url_prefix = env_or("UPLOAD_URL_PREFIX", "/uploads");
                if !url_prefix.starts_with('/') || url_prefix.len() < 2 {
                    return Err(anyhow!("invalid UPLOAD_URL_PREFIX: must start with '/'"));
                }
                UploadBackend::Local {
                    dir: PathBuf::from(env_or("UPLOAD_DIR", "static/uploads")),
                    url_prefix: url_prefix.trim_end_matches('/').to_string(),
                }
            }
            "s3" => UploadBackend::S3(S3Config {
                endpoint: env_or_err("S3_ENDPOINT")?,
                public_endpoint: std::env::var("S3_PUBLIC_ENDPOINT").ok(),
                region: env_or("S3_REGION", "us-east-1"),
                bucket: env_or_err("S3_BUCKET")?,
            }),
            other => return Err(anyhow!("unknown UPLOAD_BACKEND: {}", other)),
        };

        Ok(Self {
            http_addr,
            app_mode,
            store,
            upload: UploadConfig {
                backend,
                max_bytes: env_or_parse("UPLOAD_MAX_BYTES", "10485760")?,
            },
            session: SessionConfig {
                key: env_key_32("SESSION_KEY")?,
                ttl_hours: env_or_parse("SESSION_TTL_HOURS", "24")?,
            },
            admin_username: std::env::var("ADMIN_USERNAME").ok(),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn env_key_32(key: &str) -> Result<[u8; 32]> {
    let value = env_or_err(key)?;
    decode_key_32(&value).map_err(|err| anyhow!("invalid {}: {}", key, err))
}

/// Decodes a base64 string holding exactly 32 bytes.
pub fn decode_key_32(value: &str) -> Result<[u8; 32]> {
    let decoded = STANDARD.decode(value.trim().as_bytes())?;
    if decoded.len() != 32 {
        return Err(anyhow!("expected 32 bytes, got {}", decoded.len()));
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&decoded);
    Ok(key_bytes)
}
