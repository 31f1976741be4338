use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use wpdir_core::{
    Corpus, Effect, FetchFailure, Job, JobPhase, MatchLine, Msg, PollTimer, Progress, RecentJob,
    SummaryRow,
};
use wpdir_engine::{
    ClientConfig, EngineError, EngineEvent, EngineHandle, FailureKind, FetchError, FileRequest,
    JobPayload, MatchPayload, RecentJobPayload, SummaryItemPayload, TimerId, STATUS_COMPLETED,
    STATUS_FAILED, STATUS_QUEUED, STATUS_RUNNING,
};
use wpdir_logging::{wpdir_debug, wpdir_warn};

use super::app::LoopEvent;

const QUEUED_TIMER: TimerId = 1;
const RUNNING_TIMER: TimerId = 2;

/// Executes core effects on the engine and feeds engine events back to the
/// message loop.
pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    shutdown: Arc<AtomicBool>,
}

impl EffectRunner {
    pub fn new(config: ClientConfig, loop_tx: mpsc::Sender<LoopEvent>) -> Result<Self, EngineError> {
        let engine = Arc::new(EngineHandle::new(config)?);
        let runner = Self {
            engine,
            shutdown: Arc::new(AtomicBool::new(false)),
        };
        runner.spawn_event_pump(loop_tx);
        Ok(runner)
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            wpdir_debug!("effect {:?}", effect);
            match effect {
                Effect::FetchJob { job_id, seq } => self.engine.fetch_job(job_id, seq),
                Effect::StartPollTimer { timer, every } => {
                    self.engine.start_timer(timer_id(timer), every)
                }
                Effect::CancelPollTimer { timer } => self.engine.cancel_timer(timer_id(timer)),
                Effect::FetchSummary { job_id } => self.engine.fetch_summary(job_id),
                Effect::FetchMatches {
                    job_id,
                    slug,
                    request,
                } => self.engine.fetch_matches(job_id, slug, request),
                Effect::FetchFile { viewer, key } => self.engine.fetch_file(
                    viewer,
                    FileRequest {
                        repo: key.corpus.as_str().to_string(),
                        slug: key.slug,
                        file: key.path,
                    },
                ),
            }
        }
    }

    /// Stops every timer and the event pump. Pending responses are dropped.
    pub fn shutdown(&self) {
        self.engine.cancel_all_timers();
        self.shutdown.store(true, Ordering::Relaxed);
    }

    fn spawn_event_pump(&self, loop_tx: mpsc::Sender<LoopEvent>) {
        let engine = self.engine.clone();
        let shutdown = self.shutdown.clone();
        thread::spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                let Some(event) = engine.recv_timeout(Duration::from_millis(100)) else {
                    continue;
                };
                let Some(msg) = msg_for_event(event) else {
                    continue;
                };
                if loop_tx.send(LoopEvent::Core(msg)).is_err() {
                    break;
                }
            }
        });
    }
}

fn timer_id(timer: PollTimer) -> TimerId {
    match timer {
        PollTimer::Queued => QUEUED_TIMER,
        PollTimer::Running => RUNNING_TIMER,
    }
}

fn poll_timer(timer: TimerId) -> Option<PollTimer> {
    match timer {
        QUEUED_TIMER => Some(PollTimer::Queued),
        RUNNING_TIMER => Some(PollTimer::Running),
        _ => None,
    }
}

pub(crate) fn msg_for_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::JobFetched { seq, result } => Some(Msg::JobFetched {
            seq,
            result: result.map_err(fetch_failure).and_then(|payload| {
                job_from_payload(payload)
                    .inspect_err(|failure| wpdir_warn!("rejected job status: {failure}"))
            }),
        }),
        EngineEvent::SummaryFetched { result, .. } => Some(Msg::SummaryFetched(
            result.map_err(fetch_failure).map(summary_rows),
        )),
        EngineEvent::MatchesFetched {
            slug,
            request,
            result,
        } => {
            let result = result
                .map_err(fetch_failure)
                .map(|payloads| match_lines(&slug, payloads));
            Some(Msg::MatchesFetched {
                slug,
                request,
                result,
            })
        }
        EngineEvent::FileFetched { viewer, result } => Some(Msg::FileFetched {
            viewer,
            result: result.map_err(fetch_failure),
        }),
        EngineEvent::TimerFired { timer } => poll_timer(timer).map(Msg::PollTimerFired),
        EngineEvent::RecentFetched { .. } => None,
    }
}

pub(crate) fn fetch_failure(err: FetchError) -> FetchFailure {
    match err.kind {
        FailureKind::HttpStatus(status) => FetchFailure::Server { status },
        FailureKind::Decode | FailureKind::TooLarge { .. } => FetchFailure::InvalidResponse {
            message: err.message,
        },
        FailureKind::InvalidUrl | FailureKind::Timeout | FailureKind::Network => {
            FetchFailure::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Validates a status payload. A terminal status without a completion time
/// is rejected rather than shown.
pub(crate) fn job_from_payload(payload: JobPayload) -> Result<Job, FetchFailure> {
    let corpus = Corpus::parse(&payload.repo).ok_or_else(|| FetchFailure::InvalidResponse {
        message: format!("unknown repository `{}`", payload.repo),
    })?;
    let missing_completion = || FetchFailure::InvalidResponse {
        message: format!("job {} is finished but has no completion time", payload.id),
    };

    let phase = match payload.status {
        STATUS_QUEUED => JobPhase::Queued {
            position: payload.queue_position,
        },
        STATUS_RUNNING => JobPhase::Running {
            progress: Progress::new(payload.progress, payload.total),
        },
        STATUS_COMPLETED => JobPhase::Completed {
            completed_at: payload.completed.ok_or_else(missing_completion)?,
        },
        STATUS_FAILED => JobPhase::Failed {
            completed_at: payload.completed.ok_or_else(missing_completion)?,
        },
        other => {
            return Err(FetchFailure::InvalidResponse {
                message: format!("unknown job status {other}"),
            })
        }
    };

    Ok(Job {
        id: payload.id,
        input: payload.input,
        corpus,
        phase,
        matches: payload.matches,
        started_at: payload.started,
    })
}

fn summary_rows(items: Vec<SummaryItemPayload>) -> Vec<SummaryRow> {
    items
        .into_iter()
        .filter(|item| {
            if item.slug.trim().is_empty() {
                wpdir_warn!("dropping summary item without slug");
                return false;
            }
            true
        })
        .map(|item| SummaryRow {
            slug: item.slug,
            name: item.name,
            active_installs: item.installs,
            matches: item.matches,
        })
        .collect()
}

fn match_lines(slug: &str, payloads: Vec<MatchPayload>) -> Vec<MatchLine> {
    payloads
        .into_iter()
        .map(|payload| MatchLine {
            slug: if payload.slug.is_empty() {
                slug.to_string()
            } else {
                payload.slug
            },
            file: payload.file,
            line_number: payload.line_num,
            line_text: payload.line_text,
            before: payload.before,
            after: payload.after,
        })
        .collect()
}

pub(crate) fn recent_jobs(payloads: Vec<RecentJobPayload>) -> Vec<RecentJob> {
    payloads
        .into_iter()
        .filter_map(|payload| {
            let Some(corpus) = Corpus::parse(&payload.repo) else {
                wpdir_warn!("skipping recent job {} with repo `{}`", payload.id, payload.repo);
                return None;
            };
            Some(RecentJob {
                id: payload.id,
                input: payload.input,
                corpus,
                matches: payload.matches,
            })
        })
        .collect()
}
