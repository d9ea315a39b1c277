use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Temperature used for every reasoning-service request. Kept low and fixed so
/// repeated runs over the same metrics stay close to deterministic.
pub const REASONING_TEMPERATURE: f64 = 0.2;

const DEFAULT_REASONING_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_REASONING_MODEL: &str = "gpt-4o-mini";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub reasoning: ReasoningConfig,
    pub needs: NeedsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            reasoning: ReasoningConfig::from_env(),
            needs: NeedsConfig::from_env(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Connection settings for the external reasoning service. A missing API key
/// is legal at load time; the client reports it as unavailable per request.
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
}

impl ReasoningConfig {
    fn from_env() -> Self {
        let api_key = env::var("REASONING_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let base_url = env::var("REASONING_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_REASONING_BASE_URL.to_string());
        let model =
            env::var("REASONING_MODEL").unwrap_or_else(|_| DEFAULT_REASONING_MODEL.to_string());

        Self {
            api_key,
            base_url,
            model,
            temperature: REASONING_TEMPERATURE,
        }
    }
}

/// Location of the needs dataset loaded at startup. When unset, the service
/// falls back to its embedded sample rows.
#[derive(Debug, Clone, Default)]
pub struct NeedsConfig {
    pub data_path: Option<PathBuf>,
}

impl NeedsConfig {
    fn from_env() -> Self {
        Self {
            data_path: env::var("NEEDS_DATA_PATH")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid TCP port number")]
    InvalidPort,
    #[error("APP_HOST must be 'localhost' or a literal IP address")]
    InvalidHost { source: std::net::AddrParseError },
}
