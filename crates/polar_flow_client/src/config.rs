use crate::PolarFlowError;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://flow.polar.com";
pub const DEFAULT_THROTTLE_SECONDS: f64 = 0.5;
pub const DEFAULT_USER_AGENT: &str = concat!("polar-flow-export/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub user_agent: String,
    /// Minimum spacing between two requests to the same host.
    pub throttle_seconds: f64,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            throttle_seconds: DEFAULT_THROTTLE_SECONDS,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Check the values that would otherwise only fail on the first request.
    pub fn validate(&self) -> Result<(), PolarFlowError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| PolarFlowError::Config(format!("invalid base url '{}': {e}", self.base_url)))?;
        if url.host_str().is_none() {
            return Err(PolarFlowError::Config(format!(
                "base url '{}' has no host",
                self.base_url
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(PolarFlowError::Config("user agent must not be empty".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(PolarFlowError::Config("request timeout must be positive".into()));
        }
        Ok(())
    }

    /// Origin without a trailing slash, ready for path concatenation.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}
