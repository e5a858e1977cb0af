/// Configuration management for the portfolio service
use crate::error::{PortfolioError, PortfolioResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub content: ContentConfig,
    pub listing: ListingConfig,
    pub sessions: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
    /// Allowed CORS origins; empty allows any
    pub allowed_origins: Vec<String>,
}

/// Content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    pub backend: ContentBackendConfig,
    /// Image CDN base URL
    pub cdn_url: String,
}

/// Content store backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBackendConfig {
    Sanity {
        project_id: String,
        dataset: String,
        api_version: String,
        #[serde(skip_serializing)]
        token: Option<String>,
        use_cdn: bool,
        api_host: Option<String>,
        request_timeout_secs: Option<u64>,
    },
    Memory {
        seed_file: Option<PathBuf>,
    },
}

impl ContentBackendConfig {
    /// Project and dataset used to build asset URLs
    pub fn asset_scope(&self) -> (&str, &str) {
        match self {
            ContentBackendConfig::Sanity {
                project_id,
                dataset,
                ..
            } => (project_id, dataset),
            ContentBackendConfig::Memory { .. } => ("local", "development"),
        }
    }
}

/// Listing behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Delay before the project grid re-renders after a filter change
    pub project_transition_ms: u64,
    /// Same for skills; 0 filters immediately
    pub skill_transition_ms: u64,
}

impl ListingConfig {
    pub fn project_transition(&self) -> Duration {
        Duration::from_millis(self.project_transition_ms)
    }

    pub fn skill_transition(&self) -> Duration {
        Duration::from_millis(self.skill_transition_ms)
    }
}

/// Page session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_sessions: usize,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub submissions_per_minute: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for this crate's targets when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> PortfolioResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("PORTFOLIO_HOSTNAME").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORTFOLIO_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| PortfolioError::Validation("Invalid port number".to_string()))?;
        let version = env::var("PORTFOLIO_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());
        let allowed_origins = split_list(&env::var("PORTFOLIO_ALLOWED_ORIGINS").unwrap_or_default());

        // A configured project id selects the hosted store
        let backend = if let Ok(project_id) = env::var("PORTFOLIO_SANITY_PROJECT_ID") {
            ContentBackendConfig::Sanity {
                project_id,
                dataset: env::var("PORTFOLIO_SANITY_DATASET")
                    .unwrap_or_else(|_| "production".to_string()),
                api_version: env::var("PORTFOLIO_SANITY_API_VERSION")
                    .unwrap_or_else(|_| "2022-02-01".to_string()),
                token: env::var("PORTFOLIO_SANITY_TOKEN").ok().filter(|t| !t.is_empty()),
                use_cdn: parse_or("PORTFOLIO_SANITY_USE_CDN", true),
                api_host: env::var("PORTFOLIO_SANITY_API_HOST").ok(),
                request_timeout_secs: env::var("PORTFOLIO_SANITY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            }
        } else {
            ContentBackendConfig::Memory {
                seed_file: env::var("PORTFOLIO_SEED_FILE").map(PathBuf::from).ok(),
            }
        };
        let cdn_url = env::var("PORTFOLIO_CDN_URL")
            .unwrap_or_else(|_| crate::content::asset::DEFAULT_CDN_URL.to_string());

        let project_transition_ms = parse_or("PORTFOLIO_PROJECT_TRANSITION_MS", 350);
        let skill_transition_ms = parse_or("PORTFOLIO_SKILL_TRANSITION_MS", 0);

        let idle_ttl_secs = parse_or("PORTFOLIO_SESSION_IDLE_TTL_SECS", 1800);
        let sweep_interval_secs = parse_or("PORTFOLIO_SESSION_SWEEP_INTERVAL_SECS", 60);
        let max_sessions = parse_or("PORTFOLIO_MAX_SESSIONS", 10_000);

        let rate_limit_enabled = parse_or("PORTFOLIO_RATE_LIMITS_ENABLED", true);
        let submissions_per_minute = parse_or("PORTFOLIO_SUBMISSIONS_PER_MINUTE", 10);

        let log_level = env::var("PORTFOLIO_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let log_json = env::var("PORTFOLIO_LOG_FORMAT").map_or(false, |f| f.eq_ignore_ascii_case("json"));

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
                allowed_origins,
            },
            content: ContentConfig { backend, cdn_url },
            listing: ListingConfig {
                project_transition_ms,
                skill_transition_ms,
            },
            sessions: SessionConfig {
                idle_ttl_secs,
                sweep_interval_secs,
                max_sessions,
            },
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                submissions_per_minute,
            },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> PortfolioResult<()> {
        if self.service.hostname.is_empty() {
            return Err(PortfolioError::Validation("Hostname cannot be empty".to_string()));
        }

        if let ContentBackendConfig::Sanity {
            project_id,
            dataset,
            ..
        } = &self.content.backend
        {
            if project_id.is_empty() || !project_id.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(PortfolioError::Validation(
                    "Content project id must be alphanumeric".to_string(),
                ));
            }
            if dataset.is_empty() {
                return Err(PortfolioError::Validation("Dataset cannot be empty".to_string()));
            }
        }

        if self.sessions.max_sessions == 0 {
            return Err(PortfolioError::Validation(
                "Session capacity must be at least 1".to_string(),
            ));
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(PortfolioError::Validation(
                "Session sweep interval must be positive".to_string(),
            ));
        }
        if self.rate_limit.enabled && self.rate_limit.submissions_per_minute == 0 {
            return Err(PortfolioError::Validation(
                "Submission rate must be positive when rate limiting is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
impl ServerConfig {
    /// In-memory configuration for tests
    pub fn for_tests() -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 0,
                version: "test".to_string(),
                allowed_origins: Vec::new(),
            },
            content: ContentConfig {
                backend: ContentBackendConfig::Memory { seed_file: None },
                cdn_url: "https://cdn.example".to_string(),
            },
            listing: ListingConfig {
                project_transition_ms: 350,
                skill_transition_ms: 0,
            },
            sessions: SessionConfig {
                idle_ttl_secs: 1800,
                sweep_interval_secs: 60,
                max_sessions: 16,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                submissions_per_minute: 10,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                json: false,
            },
        }
    }
}
