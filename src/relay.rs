use std::fmt;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub mod payload;

pub use self::payload::RelayPayload;

/// Total budget for one webhook call, connection included.
pub const RELAY_TIMEOUT: Duration = Duration::from_secs(15);

const LOG_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered { body: String },
    Failed(RelayFailure),
}

impl RelayOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayFailure {
    #[error("request timed out")]
    Timeout,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("service error: status={status}")]
    Service { status: u16, body: String },
    #[error("unexpected error: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Timeout,
    ConnectionError,
    ServiceError,
    UnknownError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "Timeout",
            Self::ConnectionError => "ConnectionError",
            Self::ServiceError => "ServiceError",
            Self::UnknownError => "UnknownError",
        };
        f.write_str(name)
    }
}

impl RelayFailure {
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::Timeout => FailureReason::Timeout,
            Self::Connection(_) => FailureReason::ConnectionError,
            Self::Service { .. } => FailureReason::ServiceError,
            Self::Unknown(_) => FailureReason::UnknownError,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Timeout => "request timed out".to_string(),
            Self::Connection(detail) | Self::Unknown(detail) => detail.clone(),
            Self::Service { status, .. } => format!("status={status}"),
        }
    }
}

/// Sends one payload to one webhook. Implementations never retry and never fail:
/// every problem comes back as [`RelayOutcome::Failed`].
#[async_trait]
pub trait WebhookRelay: Send + Sync {
    async fn relay(&self, url: &Url, payload: &RelayPayload) -> RelayOutcome;
}

#[derive(Clone)]
pub struct HttpRelay {
    client: Client,
}

impl HttpRelay {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow!("failed to build webhook http client: {err}"))?;
        Ok(Self { client })
    }

    async fn post(&self, url: &Url, payload: &RelayPayload) -> Result<String, RelayFailure> {
        let response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_error)?;

        if status == StatusCode::OK {
            Ok(body)
        } else {
            Err(RelayFailure::Service {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl WebhookRelay for HttpRelay {
    async fn relay(&self, url: &Url, payload: &RelayPayload) -> RelayOutcome {
        let host = url.host_str().unwrap_or("unknown");
        debug!(
            "relaying payload to {} user_id={} channel_id={} source={:?}",
            host, payload.user_id, payload.channel_id, payload.source
        );

        match self.post(url, payload).await {
            Ok(body) => {
                info!("webhook {} delivered: {}", host, preview(&body));
                RelayOutcome::Delivered { body }
            }
            Err(failure) => {
                match &failure {
                    RelayFailure::Service { status, body } => warn!(
                        "webhook {} failed reason={} status={} body={}",
                        host,
                        failure.reason(),
                        status,
                        preview(body)
                    ),
                    _ => warn!(
                        "webhook {} failed reason={} detail={}",
                        host,
                        failure.reason(),
                        failure.detail()
                    ),
                }
                RelayOutcome::Failed(failure)
            }
        }
    }
}

fn classify_error(err: reqwest::Error) -> RelayFailure {
    if err.is_timeout() {
        RelayFailure::Timeout
    } else if err.is_connect() {
        RelayFailure::Connection(error_detail(err))
    } else {
        RelayFailure::Unknown(error_detail(err))
    }
}

/// The failure with its causes, minus the URL. Webhook paths are secrets and
/// the detail reaches Discord users.
fn error_detail(err: reqwest::Error) -> String {
    format!("{:#}", anyhow::Error::from(err.without_url()))
}

fn preview(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(LOG_BODY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
