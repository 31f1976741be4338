use std::fmt;

use crate::wire::{
    JobPayload, MatchPayload, RecentJobPayload, SummaryItemPayload,
};

/// Identifies a repeating timer owned by the caller.
pub type TimerId = u32;

/// Opaque token the caller uses to match a response to its request.
pub type RequestToken = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    JobFetched {
        seq: RequestToken,
        result: Result<JobPayload, FetchError>,
    },
    SummaryFetched {
        job_id: String,
        result: Result<Vec<SummaryItemPayload>, FetchError>,
    },
    MatchesFetched {
        slug: String,
        request: RequestToken,
        result: Result<Vec<MatchPayload>, FetchError>,
    },
    FileFetched {
        viewer: RequestToken,
        result: Result<String, FetchError>,
    },
    RecentFetched {
        result: Result<Vec<RecentJobPayload>, FetchError>,
    },
    TimerFired {
        timer: TimerId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
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
    Decode,
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
            FailureKind::Decode => write!(f, "undecodable response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid client configuration: {0}")]
    Client(#[from] FetchError),
}
