//! WPdirectory engine: HTTP access to the search API and timer execution.
mod api;
mod config;
mod engine;
mod types;
pub mod wire;

pub use api::{ReqwestSearchApi, SearchApi};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use engine::{ChannelEventSink, EngineHandle, EventSink};
pub use types::{EngineError, EngineEvent, FailureKind, FetchError, RequestToken, TimerId};
pub use wire::{
    FileRequest, JobPayload, MatchPayload, RecentJobPayload, SummaryItemPayload, STATUS_COMPLETED,
    STATUS_FAILED, STATUS_QUEUED, STATUS_RUNNING,
};
