use std::time::Duration;
use thiserror::Error;

/// A block or verification page was served instead of content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("blocked by {host} (marker {marker}, http {status}) at {url}")]
pub struct BlockedError {
    pub url: String,
    pub host: String,
    pub status: u16,
    pub marker: String,
    pub snippet: String,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("url has no host: {0}")]
    MissingHost(String),

    #[error(transparent)]
    Blocked(#[from] BlockedError),

    /// Non-success status outside the retryable set.
    #[error("http error {status}")]
    Http { status: reqwest::StatusCode },

    #[error("retryable http error {status}")]
    Retryable {
        status: reqwest::StatusCode,
        wait_hint: Option<Duration>,
    },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connect error: {0}")]
    Connect(String),

    #[error("too many redirects")]
    RedirectLoop,

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::InvalidUrl(_) => false,
            Self::MissingHost(_) => false,
            Self::Blocked(_) => false,
            Self::Http { .. } => false,
            Self::BodyTooLarge(_) => false,
            Self::RedirectLoop => false,
            Self::RetriesExhausted { .. } => false,

            Self::Retryable { .. } => true,
            Self::Timeout(_) => true,
            Self::Connect(_) => true,
            Self::Transport(_) => true,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    pub fn as_blocked(&self) -> Option<&BlockedError> {
        match self {
            Self::Blocked(blocked) => Some(blocked),
            _ => None,
        }
    }

    /// Wait suggested by the server, where one was given.
    pub fn wait_hint(&self) -> Option<Duration> {
        match self {
            Self::Retryable { wait_hint, .. } => *wait_hint,
            _ => None,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::Http { status }
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_timeout() {
            Self::Transport(format!("timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}
