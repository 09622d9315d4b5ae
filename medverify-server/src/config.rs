//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible
//! defaults. Collaborator settings (bucket, table, WebDriver, vision
//! endpoint) are optional; when absent the server falls back to in-memory
//! stand-ins suitable for development only.

use std::net::SocketAddr;

use medverify_core::DEFAULT_RETENTION_DAYS;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 25; bodies are base64 images)
    pub body_limit_mb: usize,
    /// Request timeout in seconds (default: 90; the registry browser
    /// session dominates worst-case latency)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded
    /// from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// S3 bucket for source images; enables S3 + Textract when set
    pub image_bucket: Option<String>,
    /// DynamoDB table for verification records; enables DynamoDB when set
    pub verification_table: Option<String>,
    /// WebDriver endpoint driving the registry browser session
    pub webdriver_url: Option<String>,
    /// Registry search page URL
    pub registry_page_url: String,
    /// Vision model messages endpoint; enables the naming fallback when
    /// set together with the API key
    pub vision_endpoint: Option<String>,
    /// Vision model identifier
    pub vision_model: String,
    /// Vision model API key
    pub vision_api_key: Option<String>,
    /// Record retention horizon in days (default: 90)
    pub retention_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 25,
            timeout_secs: 90,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            image_bucket: None,
            verification_table: None,
            webdriver_url: None,
            registry_page_url: "https://greenbook.nafdac.gov.ng/".to_string(),
            vision_endpoint: None,
            vision_model: "claude-3-haiku-20240307".to_string(),
            vision_api_key: None,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let body_limit_mb = std::env::var("BODY_LIMIT_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.body_limit_mb);

        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        // Rate limiting enabled by default in production, can be disabled
        // with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let rate_limit_per_sec = std::env::var("RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_per_sec);

        let rate_limit_burst = std::env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_burst);

        let image_bucket = std::env::var("IMAGE_BUCKET_NAME").ok().filter(|s| !s.is_empty());

        let verification_table = std::env::var("VERIFICATION_TABLE_NAME")
            .ok()
            .filter(|s| !s.is_empty());

        let webdriver_url = std::env::var("WEBDRIVER_URL").ok().filter(|s| !s.is_empty());

        let registry_page_url =
            std::env::var("REGISTRY_PAGE_URL").unwrap_or(defaults.registry_page_url);

        let vision_endpoint = std::env::var("VISION_API_URL").ok().filter(|s| !s.is_empty());
        let vision_model = std::env::var("VISION_MODEL").unwrap_or(defaults.vision_model);
        let vision_api_key = std::env::var("VISION_API_KEY").ok().filter(|s| !s.is_empty());

        let retention_days = std::env::var("RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.retention_days);

        Self {
            port,
            host,
            allowed_origins,
            body_limit_mb,
            timeout_secs,
            rate_limit_enabled,
            rate_limit_per_sec,
            rate_limit_burst,
            image_bucket,
            verification_table,
            webdriver_url,
            registry_page_url,
            vision_endpoint,
            vision_model,
            vision_api_key,
            retention_days,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}
