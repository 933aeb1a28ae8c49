//! Polar Flow session client and bulk TCX exporter.
//!
//! The [`exporter::Exporter`] logs in lazily, lists the calendar events in a date
//! range and downloads every supported activity as a TCX file, handing each one to an
//! [`ActivitySink`] as soon as it arrives.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub mod config;
pub mod exporter;
pub mod rate_limit;
pub mod session;
pub mod utils;

pub use config::{Config, Credentials};
pub use exporter::Exporter;

#[derive(Debug, Error)]
pub enum PolarFlowError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("too many redirects, last at {url}")]
    TooManyRedirects { url: String },
    #[error("invalid date '{input}': expected an ISO-8601 date")]
    DateParse { input: String },
    #[error("invalid calendar response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One entry of the calendar events listing.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReference {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub list_item_id: String,
    pub datetime: String,
    pub url: String,
}

/// A downloaded TCX workout file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityRecord {
    pub workout_id: String,
    pub date_str: String,
    pub content: Vec<u8>,
}

impl ActivityRecord {
    /// Name of the file this record is written to: `{date_str}_{workout_id}.tcx`
    /// with every `:` of the date replaced by `_`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.tcx", self.date_str.replace(':', "_"), self.workout_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// Activity type the service cannot export as TCX.
    Unsupported,
    /// The service answered 400 or 404.
    HttpStatus(u16),
    EmptyContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedDownload {
    pub url: String,
    pub reason: FailureReason,
}

impl std::fmt::Display for FailedDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            FailureReason::Unsupported => write!(f, "{} (unsupported activity type)", self.url),
            FailureReason::HttpStatus(status) => write!(f, "{} (http {})", self.url, status),
            FailureReason::EmptyContent => write!(f, "{} (empty response)", self.url),
        }
    }
}

/// Receives each activity as soon as it has been downloaded.
///
/// An error returned here aborts the export run.
#[async_trait]
pub trait ActivitySink: Send {
    async fn accept(&mut self, record: &ActivityRecord) -> Result<(), PolarFlowError>;
}

#[async_trait]
impl ActivitySink for Vec<ActivityRecord> {
    async fn accept(&mut self, record: &ActivityRecord) -> Result<(), PolarFlowError> {
        self.push(record.clone());
        Ok(())
    }
}

fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
