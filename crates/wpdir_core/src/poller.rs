//! Job lifecycle tracking with adaptive re-polling.
//!
//! The poller never touches a clock or a socket. It answers each input with
//! the effects the runtime has to perform: issue a status fetch, start one of
//! the two repeating timers, or cancel one.

use std::time::Duration;

use crate::job::{FetchFailure, Job, JobId, JobStatus};

/// The two repeating timers. At most one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollTimer {
    Queued,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub queued: Duration,
    pub running: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            queued: Duration::from_secs(5),
            running: Duration::from_secs(2),
        }
    }
}

impl PollIntervals {
    pub fn every(&self, timer: PollTimer) -> Duration {
        match timer {
            PollTimer::Queued => self.queued,
            PollTimer::Running => self.running,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEffect {
    FetchStatus { job_id: JobId, seq: u64 },
    StartTimer { timer: PollTimer, every: Duration },
    CancelTimer { timer: PollTimer },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPoller {
    job_id: JobId,
    intervals: PollIntervals,
    snapshot: Option<Job>,
    error: Option<FetchFailure>,
    queued_timer: bool,
    running_timer: bool,
    next_seq: u64,
    applied_seq: u64,
    activated: bool,
    torn_down: bool,
}

impl JobPoller {
    pub fn new(job_id: impl Into<JobId>, intervals: PollIntervals) -> Self {
        Self {
            job_id: job_id.into(),
            intervals,
            snapshot: None,
            error: None,
            queued_timer: false,
            running_timer: false,
            next_seq: 0,
            applied_seq: 0,
            activated: false,
            torn_down: false,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn snapshot(&self) -> Option<&Job> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn active_timer(&self) -> Option<PollTimer> {
        if self.queued_timer {
            Some(PollTimer::Queued)
        } else if self.running_timer {
            Some(PollTimer::Running)
        } else {
            None
        }
    }

    /// Terminal only once a successful fetch has reported it.
    pub fn is_terminal(&self) -> bool {
        self.snapshot.as_ref().is_some_and(Job::is_terminal)
    }

    /// Issues the first status fetch. Later calls are no-ops.
    pub fn activate(&mut self) -> Vec<PollEffect> {
        if self.activated || self.torn_down {
            return Vec::new();
        }
        self.activated = true;
        vec![self.issue_fetch()]
    }

    /// A repeating timer fired. Ticks from a timer that is no longer active
    /// (already cancelled, or superseded by the other one) are dropped.
    pub fn timer_fired(&mut self, timer: PollTimer) -> Vec<PollEffect> {
        if self.torn_down || self.is_terminal() || !self.is_timer_on(timer) {
            return Vec::new();
        }
        vec![self.issue_fetch()]
    }

    /// Applies a fetch result. Results older than the newest applied one,
    /// results after teardown and results after a terminal status are ignored.
    pub fn fetch_completed(
        &mut self,
        seq: u64,
        result: Result<Job, FetchFailure>,
    ) -> Vec<PollEffect> {
        if self.torn_down || self.is_terminal() || seq <= self.applied_seq {
            return Vec::new();
        }
        self.applied_seq = seq;

        match result {
            Ok(job) => {
                let status = job.status();
                self.snapshot = Some(job);
                self.error = None;
                self.schedule_for(status)
            }
            Err(failure) => {
                self.error = Some(failure);
                // A failure never stops polling. Without any known status the
                // queued cadence is used.
                match self.snapshot.as_ref().map(Job::status) {
                    Some(status) => self.schedule_for(status),
                    None => self.schedule_for(JobStatus::Queued),
                }
            }
        }
    }

    /// Cancels whatever timer is active. Safe to call any number of times;
    /// only the first call can produce effects.
    pub fn teardown(&mut self) -> Vec<PollEffect> {
        if self.torn_down {
            return Vec::new();
        }
        self.torn_down = true;
        self.cancel_all()
    }

    fn issue_fetch(&mut self) -> PollEffect {
        self.next_seq += 1;
        PollEffect::FetchStatus {
            job_id: self.job_id.clone(),
            seq: self.next_seq,
        }
    }

    fn is_timer_on(&self, timer: PollTimer) -> bool {
        match timer {
            PollTimer::Queued => self.queued_timer,
            PollTimer::Running => self.running_timer,
        }
    }

    fn set_timer(&mut self, timer: PollTimer, on: bool) {
        match timer {
            PollTimer::Queued => self.queued_timer = on,
            PollTimer::Running => self.running_timer = on,
        }
    }

    fn schedule_for(&mut self, status: JobStatus) -> Vec<PollEffect> {
        match status {
            JobStatus::Queued => self.switch_to(PollTimer::Queued, PollTimer::Running),
            JobStatus::Running => self.switch_to(PollTimer::Running, PollTimer::Queued),
            JobStatus::Completed | JobStatus::Failed => self.cancel_all(),
        }
    }

    fn switch_to(&mut self, wanted: PollTimer, other: PollTimer) -> Vec<PollEffect> {
        let mut effects = Vec::new();
        if self.is_timer_on(other) {
            self.set_timer(other, false);
            effects.push(PollEffect::CancelTimer { timer: other });
        }
        if !self.is_timer_on(wanted) {
            self.set_timer(wanted, true);
            effects.push(PollEffect::StartTimer {
                timer: wanted,
                every: self.intervals.every(wanted),
            });
        }
        effects
    }

    fn cancel_all(&mut self) -> Vec<PollEffect> {
        let mut effects = Vec::new();
        for timer in [PollTimer::Queued, PollTimer::Running] {
            if self.is_timer_on(timer) {
                self.set_timer(timer, false);
                effects.push(PollEffect::CancelTimer { timer });
            }
        }
        effects
    }
}
