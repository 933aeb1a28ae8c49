//! Command line arguments.

use clap::Parser;
use polar_flow_client::config::{DEFAULT_BASE_URL, DEFAULT_THROTTLE_SECONDS, DEFAULT_USER_AGENT};
use polar_flow_client::{Config, Credentials};
use std::path::PathBuf;
use std::time::Duration;

/// Bulk export a range of TCX files from Polar Flow.
///
/// Example: polar-flow-export me@me.com mypassword 2015-08-01 2015-08-30 /tmp/tcxfiles
#[derive(Parser, Debug)]
#[command(name = "polar-flow-export", version, about, long_about = None)]
pub struct Cli {
    /// Polar Flow account email
    pub username: String,

    /// Polar Flow account password
    pub password: String,

    /// First day to export (ISO-8601, e.g. 2015-08-01)
    pub from_date: String,

    /// Last day to export, inclusive (ISO-8601)
    pub to_date: String,

    /// Directory the TCX files are written to; created if missing
    pub output_dir: PathBuf,

    /// Minimum number of seconds between two requests
    #[arg(long, default_value_t = DEFAULT_THROTTLE_SECONDS)]
    pub throttle: f64,

    /// Polar Flow origin
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Log filter, e.g. `debug` or `info,polar_flow_client=trace`
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            base_url: self.base_url.clone(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            throttle_seconds: self.throttle,
            request_timeout: Duration::from_secs(self.timeout),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}
