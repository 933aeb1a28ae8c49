//! Login-gated export of TCX files for a date range.

use crate::session::{Fetched, FlowSession};
use crate::utils::{calendar_events_path, parse_calendar_date};
use crate::{
    ActivityRecord, ActivityReference, ActivitySink, Config, Credentials, FailedDownload,
    FailureReason, PolarFlowError,
};
use reqwest::StatusCode;
use secrecy::ExposeSecret;

/// URL markers of activity types that have no TCX export.
const UNSUPPORTED_MARKERS: &[&str] = &["fitness", "orthostatic"];

/// What happened to a single calendar entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivityOutcome {
    Downloaded(ActivityRecord),
    Failed(FailedDownload),
}

/// Exports TCX files from Polar Flow.
///
/// The first call to [`Exporter::export_range`] logs in; the session then stays
/// authenticated for the life of the exporter. Activities that could not be downloaded
/// accumulate in [`Exporter::failures`] across calls.
#[derive(Debug)]
pub struct Exporter {
    session: FlowSession,
    credentials: Credentials,
    logged_in: bool,
    failed_downloads: Vec<FailedDownload>,
}

impl Exporter {
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self, PolarFlowError> {
        Ok(Self {
            session: FlowSession::new(config)?,
            credentials,
            logged_in: false,
            failed_downloads: Vec::new(),
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn failures(&self) -> &[FailedDownload] {
        &self.failed_downloads
    }

    /// Establish a session cookie and post the credentials.
    ///
    /// The login response is not inspected: bad credentials only show up later as
    /// failed downloads.
    pub async fn login(&mut self) -> Result<(), PolarFlowError> {
        tracing::info!(user = %self.credentials.username, "logging in");
        let bootstrap = self.session.issue_request("/", None).await?;
        self.record_recoverable(bootstrap);

        let return_url = format!("{}/", self.session.origin());
        let params = [
            ("returnUrl", return_url.as_str()),
            ("email", self.credentials.username.as_str()),
            ("password", self.credentials.password.expose_secret()),
        ];
        let login = self.session.issue_request("/login", Some(&params[..])).await?;
        self.record_recoverable(login);

        self.logged_in = true;
        tracing::info!("logged in");
        Ok(())
    }

    /// Download every supported activity between two ISO-8601 dates, inclusive.
    ///
    /// Each record is passed to `sink` as soon as it is downloaded and is also part of
    /// the returned list. 400/404 answers and unsupported activity types are recorded
    /// in [`Exporter::failures`]; any other error aborts the whole call.
    pub async fn export_range<S>(
        &mut self,
        from_date: &str,
        to_date: &str,
        sink: &mut S,
    ) -> Result<Vec<ActivityRecord>, PolarFlowError>
    where
        S: ActivitySink + ?Sized,
    {
        tracing::info!(from = from_date, to = to_date, "fetching TCX files");
        let from = parse_calendar_date(from_date)?;
        let to = parse_calendar_date(to_date)?;
        if from > to {
            tracing::warn!(%from, %to, "start date is after end date");
        }

        if !self.logged_in {
            self.login().await?;
        }

        let refs = self.query_activities(&calendar_events_path(from, to)).await?;
        tracing::info!(count = refs.len(), "calendar events listed");

        let mut records = Vec::new();
        for activity in &refs {
            match self.fetch_activity(activity).await? {
                ActivityOutcome::Downloaded(record) => {
                    sink.accept(&record).await?;
                    records.push(record);
                }
                ActivityOutcome::Failed(failure) => self.failed_downloads.push(failure),
            }
        }
        Ok(records)
    }

    /// List the activity references behind a calendar events path.
    ///
    /// A 400/404 answer or an empty body yields an empty list.
    pub async fn query_activities(
        &mut self,
        path: &str,
    ) -> Result<Vec<ActivityReference>, PolarFlowError> {
        let body = match self.session.issue_request(path, None).await? {
            Fetched::Content(body) => body,
            recoverable => {
                self.record_recoverable(recoverable);
                return Ok(Vec::new());
            }
        };
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub fn should_skip(activity: &ActivityReference) -> bool {
        UNSUPPORTED_MARKERS.iter().any(|m| activity.url.contains(m))
    }

    /// Download one activity, or explain why it was not downloaded.
    pub async fn fetch_activity(
        &mut self,
        activity: &ActivityReference,
    ) -> Result<ActivityOutcome, PolarFlowError> {
        if Self::should_skip(activity) {
            tracing::warn!(url = %activity.url, "unsupported activity type, skipping");
            return Ok(ActivityOutcome::Failed(FailedDownload {
                url: activity.url.clone(),
                reason: FailureReason::Unsupported,
            }));
        }

        tracing::info!(url = %activity.url, "retrieving workout");
        let path = format!("{}/export/tcx/false", activity.url);
        let reason = match self.session.issue_request(&path, None).await? {
            Fetched::Content(content) if !content.is_empty() => {
                return Ok(ActivityOutcome::Downloaded(ActivityRecord {
                    workout_id: activity.list_item_id.clone(),
                    date_str: activity.datetime.clone(),
                    content,
                }));
            }
            Fetched::Content(_) => {
                tracing::error!(url = %activity.url, "empty TCX export");
                FailureReason::EmptyContent
            }
            Fetched::Recoverable { url, status } => {
                self.notify_http_error(&url, status);
                FailureReason::HttpStatus(status.as_u16())
            }
        };
        Ok(ActivityOutcome::Failed(FailedDownload {
            url: activity.url.clone(),
            reason,
        }))
    }

    fn notify_http_error(&self, url: &str, status: StatusCode) {
        tracing::error!(%url, status = status.as_u16(), "error fetching");
    }

    fn record_recoverable(&mut self, fetched: Fetched) {
        if let Fetched::Recoverable { url, status } = fetched {
            self.notify_http_error(&url, status);
            self.failed_downloads.push(FailedDownload {
                url,
                reason: FailureReason::HttpStatus(status.as_u16()),
            });
        }
    }
}
