use std::fmt;

use bytes::Bytes;
use thiserror::Error;

pub type RequestId = u64;

/// Identifies one debounce timer; restarting a key replaces its pending timer.
pub type TimerKey = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeEndpoint {
    JobPosting,
    Application,
}

impl GradeEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            GradeEndpoint::JobPosting => "/api/jobs/live-grade/",
            GradeEndpoint::Application => "/api/applications/live-grade/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeQuery {
    pub endpoint: GradeEndpoint,
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFile {
    pub name: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub path: String,
    pub fields: Vec<(String, String)>,
    pub files: Vec<SubmitFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitResponse {
    pub status: u16,
    pub id: Option<String>,
    pub redirect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    QuietPeriodElapsed {
        key: TimerKey,
        token: u64,
    },
    ScoreCompleted {
        request_id: RequestId,
        result: Result<u32, ApiError>,
    },
    SubmissionCompleted {
        result: Result<SubmitResponse, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    InvalidResponse,
    InvalidRequest,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
