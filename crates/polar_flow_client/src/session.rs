//! Cookie-carrying HTTP session against the Polar Flow origin.
//!
//! Every request goes through the session's [`RateLimiter`], keyed by destination
//! host, and carries the configured `User-Agent`. Cookies set by any response are sent
//! on all later requests.

use crate::{PolarFlowError, config::Config, rate_limit::RateLimiter};
use reqwest::StatusCode;
use reqwest::header::LOCATION;

/// Same hop limit reqwest applies when it follows redirects itself.
const MAX_REDIRECTS: usize = 10;

/// Result of a request that did not fail fatally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched {
    /// Raw response body, possibly empty.
    Content(Vec<u8>),
    /// The service answered 400 or 404; there is no body to use.
    Recoverable { url: String, status: StatusCode },
}

impl Fetched {
    pub fn into_content(self) -> Option<Vec<u8>> {
        match self {
            Fetched::Content(body) => Some(body),
            Fetched::Recoverable { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct FlowSession {
    origin: String,
    client: reqwest::Client,
    limiter: RateLimiter,
}

impl FlowSession {
    pub fn new(config: &Config) -> Result<Self, PolarFlowError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            origin: config.origin().to_string(),
            client,
            limiter: RateLimiter::new(config.throttle_seconds),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Issue a request for `path` relative to the session origin.
    ///
    /// With `form` the request is a form-encoded POST, otherwise a GET. Redirects are
    /// followed hop by hop, each hop waiting on the limiter for its own host. 400 and
    /// 404 come back as [`Fetched::Recoverable`]; any other non-success status and
    /// every transport failure is an error.
    pub async fn issue_request(
        &mut self,
        path: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Fetched, PolarFlowError> {
        let mut url = format!("{}{}", self.origin, path);
        let mut form = form;
        tracing::debug!(%url, post = form.is_some(), "requesting");

        for _ in 0..=MAX_REDIRECTS {
            let host = host_key(&url)?;
            self.limiter.wait(&host).await;

            let request = match form {
                Some(params) => self.client.post(&url).form(params),
                None => self.client.get(&url),
            };
            let resp = request.send().await?;
            let status = resp.status();

            if status.is_redirection() {
                if let Some(next) = redirect_target(&url, &resp)? {
                    // 307/308 repeat the request as is, the others turn into a GET.
                    if status != StatusCode::TEMPORARY_REDIRECT
                        && status != StatusCode::PERMANENT_REDIRECT
                    {
                        form = None;
                    }
                    tracing::debug!(from = %url, to = %next, status = status.as_u16(), "following redirect");
                    url = next;
                    continue;
                }
            }

            if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
                return Ok(Fetched::Recoverable { url, status });
            }
            if !(status.is_success() || status.is_redirection()) {
                let body = resp.text().await.unwrap_or_default();
                let snippet: String = body.chars().take(256).collect();
                tracing::error!(%url, status = status.as_u16(), body = %snippet, "request failed");
                return Err(PolarFlowError::Status {
                    url,
                    status: status.as_u16(),
                });
            }
            return Ok(Fetched::Content(resp.bytes().await?.to_vec()));
        }
        Err(PolarFlowError::TooManyRedirects { url })
    }
}

/// Absolute URL named by a redirect's `Location` header, if it has one.
fn redirect_target(
    current: &str,
    resp: &reqwest::Response,
) -> Result<Option<String>, PolarFlowError> {
    let Some(location) = resp.headers().get(LOCATION) else {
        return Ok(None);
    };
    let location = location
        .to_str()
        .map_err(|e| PolarFlowError::Config(format!("invalid redirect from '{current}': {e}")))?;
    let next = reqwest::Url::parse(current)
        .and_then(|base| base.join(location))
        .map_err(|e| {
            PolarFlowError::Config(format!("invalid redirect '{location}' from '{current}': {e}"))
        })?;
    Ok(Some(next.to_string()))
}

/// Throttling key of a URL: `host:port`, with the scheme's default port filled in.
fn host_key(url: &str) -> Result<String, PolarFlowError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| PolarFlowError::Config(format!("invalid request url '{url}': {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| PolarFlowError::Config(format!("request url '{url}' has no host")))?;
    Ok(match parsed.port_or_known_default() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
