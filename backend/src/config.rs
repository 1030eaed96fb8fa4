use axum::http::HeaderValue;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://127.0.0.1:8080,http://127.0.0.1:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Campaign JSON; the bundled campaign is used when unset.
    pub campaign_file: Option<PathBuf>,
    /// Where contact documents are POSTed. Unset means submissions are only logged.
    pub document_store_url: Option<String>,
    pub session_ttl: Duration,
    pub allowed_origins: Vec<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            campaign_file: None,
            document_store_url: None,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            allowed_origins: Vec::new(),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_addr.clone(),
        })?;

        let session_ttl = match var("SESSION_TTL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "SESSION_TTL_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        };

        let origins = var("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());
        let allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|_| ConfigError::Invalid {
                    name: "ALLOWED_ORIGINS",
                    value: o.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bind_addr,
            campaign_file: var("CAMPAIGN_FILE").map(PathBuf::from),
            document_store_url: var("DOCUMENT_STORE_URL"),
            session_ttl,
            allowed_origins,
        })
    }
}
