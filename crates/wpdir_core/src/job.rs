use std::fmt;

use chrono::{DateTime, Utc};

pub type JobId = String;

/// Which directory a job searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corpus {
    Plugins,
    Themes,
}

impl Corpus {
    pub fn as_str(self) -> &'static str {
        match self {
            Corpus::Plugins => "plugins",
            Corpus::Themes => "themes",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plugins" => Some(Corpus::Plugins),
            "themes" => Some(Corpus::Themes),
            _ => None,
        }
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Running => "Running",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }
}

/// Work done so far on a running job. `done` never exceeds `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    done: u32,
    total: u32,
}

impl Progress {
    /// Builds a progress value, clamping `done` to `total`.
    pub fn new(done: u32, total: u32) -> Self {
        Self {
            done: done.min(total),
            total,
        }
    }

    pub fn done(self) -> u32 {
        self.done
    }

    pub fn total(self) -> u32 {
        self.total
    }

    /// Whole-number percentage; a zero denominator reads as 0%.
    pub fn percent(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((u64::from(self.done) * 100) / u64::from(self.total)) as u8
    }
}

/// Lifecycle phase with the data that is only meaningful in that phase.
///
/// Encoding the completion timestamp inside the terminal variants makes
/// "completed_at is set iff the job is terminal" hold by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Queued { position: Option<u32> },
    Running { progress: Progress },
    Completed { completed_at: DateTime<Utc> },
    Failed { completed_at: DateTime<Utc> },
}

impl JobPhase {
    pub fn status(&self) -> JobStatus {
        match self {
            JobPhase::Queued { .. } => JobStatus::Queued,
            JobPhase::Running { .. } => JobStatus::Running,
            JobPhase::Completed { .. } => JobStatus::Completed,
            JobPhase::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// One snapshot of a server-side search job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub input: String,
    pub corpus: Corpus,
    pub phase: JobPhase,
    pub matches: u64,
    pub started_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn status(&self) -> JobStatus {
        self.phase.status()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self.phase {
            JobPhase::Completed { completed_at } | JobPhase::Failed { completed_at } => {
                Some(completed_at)
            }
            JobPhase::Queued { .. } | JobPhase::Running { .. } => None,
        }
    }

    pub fn queue_position(&self) -> Option<u32> {
        match self.phase {
            JobPhase::Queued { position } => position,
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        match self.phase {
            JobPhase::Running { progress } => Some(progress),
            _ => None,
        }
    }
}

/// Entry of the recent-jobs listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentJob {
    pub id: JobId,
    pub input: String,
    pub corpus: Corpus,
    pub matches: u64,
}

/// Why a fetch did not produce usable data. Scoped to the component that
/// issued the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// No response: connection failure, timeout or unusable address.
    Network { message: String },
    /// The server answered with a non-success status.
    Server { status: u16 },
    /// A success response whose body could not be used.
    InvalidResponse { message: String },
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Network { message } => write!(f, "network failure: {message}"),
            FetchFailure::Server { status } => write!(f, "server error (status {status})"),
            FetchFailure::InvalidResponse { message } => {
                write!(f, "invalid response: {message}")
            }
        }
    }
}
