//! Client configuration for NCBI E-utilities and the PMC OA service

use std::path::Path;
use std::time::Duration;

use crate::rate_limit::RateLimiter;
use crate::retry::RetryConfig;

/// Default E-utilities base URL
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Default PMC Open Access web service URL
pub const DEFAULT_OA_URL: &str = "https://www.ncbi.nlm.nih.gov/pmc/utils/oa/oa.fcgi";

/// Default tool name reported to NCBI
pub const DEFAULT_TOOL: &str = "pmc-crawler";

/// Optional environment file read from the working directory at startup
pub const ENV_FILE_NAME: &str = ".env";

/// Load `dir/.env` into the process environment
///
/// Variables that are already set keep their values. Parent directories are
/// never searched. Returns `Ok(false)` when there is no such file.
pub fn load_env_file(dir: &Path) -> std::result::Result<bool, dotenvy::Error> {
    match dotenvy::from_path(dir.join(ENV_FILE_NAME)) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Configuration shared by all clients of a crawl session
///
/// # Example
///
/// ```
/// use pmc_crawler::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_api_key("your_api_key_here")
///     .with_email("researcher@university.edu");
///
/// assert_eq!(config.effective_request_delay(), Duration::from_millis(340));
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// NCBI API key (raises the request ceiling to 10/s)
    pub api_key: Option<String>,
    /// Contact email sent with every request
    pub email: Option<String>,
    /// Tool name sent with every request
    pub tool: Option<String>,
    /// Override for the E-utilities base URL
    pub base_url: Option<String>,
    /// Override for the OA service URL
    pub oa_base_url: Option<String>,
    /// Timeout for API calls
    pub timeout: Duration,
    /// Timeout for file downloads
    pub download_timeout: Duration,
    /// Override for the delay before each request
    pub request_delay: Option<Duration>,
    /// Retry policy for transient failures
    pub retry_config: RetryConfig,
    /// Override for the User-Agent header
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tool<S: Into<String>>(mut self, tool: S) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_oa_base_url<S: Into<String>>(mut self, oa_base_url: S) -> Self {
        self.oa_base_url = Some(oa_base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn effective_oa_url(&self) -> &str {
        self.oa_base_url.as_deref().unwrap_or(DEFAULT_OA_URL)
    }

    pub fn effective_tool(&self) -> &str {
        self.tool.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("pmc-crawler/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Delay before each request: explicit override, else 340ms with an API key, else 500ms
    pub fn effective_request_delay(&self) -> Duration {
        match (self.request_delay, &self.api_key) {
            (Some(delay), _) => delay,
            (None, Some(_)) => RateLimiter::ncbi_with_key().delay(),
            (None, None) => RateLimiter::ncbi_default().delay(),
        }
    }

    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_request_delay())
    }

    /// Parameters appended to every API request
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(api_key) = &self.api_key {
            params.push(("api_key".to_string(), api_key.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }
        params.push(("tool".to_string(), self.effective_tool().to_string()));

        params
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            email: None,
            tool: None,
            base_url: None,
            oa_base_url: None,
            timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(120),
            request_delay: None,
            retry_config: RetryConfig::default(),
            user_agent: None,
        }
    }
}
