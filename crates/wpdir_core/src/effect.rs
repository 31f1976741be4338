use std::time::Duration;

use crate::{FileKey, JobId, PollTimer, ViewerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchJob { job_id: JobId, seq: u64 },
    StartPollTimer { timer: PollTimer, every: Duration },
    CancelPollTimer { timer: PollTimer },
    FetchSummary { job_id: JobId },
    FetchMatches {
        job_id: JobId,
        slug: String,
        request: u64,
    },
    FetchFile { viewer: ViewerId, key: FileKey },
}
