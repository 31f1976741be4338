use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use wpdir_logging::wpdir_debug;

use crate::api::{ReqwestSearchApi, SearchApi};
use crate::wire::FileRequest;
use crate::{ClientConfig, EngineError, EngineEvent, RequestToken, TimerId};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    FetchJob {
        job_id: String,
        seq: RequestToken,
    },
    FetchSummary {
        job_id: String,
    },
    FetchMatches {
        job_id: String,
        slug: String,
        request: RequestToken,
    },
    FetchFile {
        viewer: RequestToken,
        request: FileRequest,
    },
    FetchRecent {
        limit: usize,
    },
    StartTimer {
        timer: TimerId,
        every: Duration,
        token: CancellationToken,
    },
}

/// Runs requests and repeating timers on a background tokio runtime and
/// reports their outcomes as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
    timers: Mutex<HashMap<TimerId, CancellationToken>>,
}

impl EngineHandle {
    pub fn new(config: ClientConfig) -> Result<Self, EngineError> {
        let api = ReqwestSearchApi::new(config)?;
        Self::with_api(Arc::new(api))
    }

    pub fn with_api(api: Arc<dyn SearchApi>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("wpdir-engine")
            .build()?;

        thread::spawn(move || {
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    handle_command(api.as_ref(), command, sink).await;
                });
            }
            wpdir_debug!("engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
            timers: Mutex::new(HashMap::new()),
        })
    }

    pub fn fetch_job(&self, job_id: impl Into<String>, seq: RequestToken) {
        self.send(EngineCommand::FetchJob {
            job_id: job_id.into(),
            seq,
        });
    }

    pub fn fetch_summary(&self, job_id: impl Into<String>) {
        self.send(EngineCommand::FetchSummary {
            job_id: job_id.into(),
        });
    }

    pub fn fetch_matches(
        &self,
        job_id: impl Into<String>,
        slug: impl Into<String>,
        request: RequestToken,
    ) {
        self.send(EngineCommand::FetchMatches {
            job_id: job_id.into(),
            slug: slug.into(),
            request,
        });
    }

    pub fn fetch_file(&self, viewer: RequestToken, request: FileRequest) {
        self.send(EngineCommand::FetchFile { viewer, request });
    }

    pub fn fetch_recent(&self, limit: usize) {
        self.send(EngineCommand::FetchRecent { limit });
    }

    /// Starts a timer that emits [`EngineEvent::TimerFired`] every `every`,
    /// first after one full period. Restarting an id replaces the old timer.
    pub fn start_timer(&self, timer: TimerId, every: Duration) {
        let token = CancellationToken::new();
        if let Some(previous) = self.lock_timers().insert(timer, token.clone()) {
            previous.cancel();
        }
        self.send(EngineCommand::StartTimer {
            timer,
            every,
            token,
        });
    }

    /// Stops a timer. A tick can still be delivered afterwards, either
    /// queued before the call or emitted by a task that was already past its
    /// cancellation check, so consumers must drop ticks for timers they no
    /// longer run.
    pub fn cancel_timer(&self, timer: TimerId) {
        if let Some(token) = self.lock_timers().remove(&timer) {
            token.cancel();
        }
    }

    pub fn cancel_all_timers(&self) {
        for (_, token) in self.lock_timers().drain() {
            token.cancel();
        }
    }

    pub fn active_timers(&self) -> usize {
        self.lock_timers().len()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<TimerId, CancellationToken>> {
        self.timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel_all_timers();
    }
}

async fn handle_command(api: &dyn SearchApi, command: EngineCommand, sink: Arc<dyn EventSink>) {
    match command {
        EngineCommand::FetchJob { job_id, seq } => {
            let result = api.job(&job_id).await;
            sink.emit(EngineEvent::JobFetched { seq, result });
        }
        EngineCommand::FetchSummary { job_id } => {
            let result = api.summary(&job_id).await;
            sink.emit(EngineEvent::SummaryFetched { job_id, result });
        }
        EngineCommand::FetchMatches {
            job_id,
            slug,
            request,
        } => {
            let result = api.matches(&job_id, &slug).await;
            sink.emit(EngineEvent::MatchesFetched {
                slug,
                request,
                result,
            });
        }
        EngineCommand::FetchFile { viewer, request } => {
            let result = api.file_content(&request).await;
            sink.emit(EngineEvent::FileFetched { viewer, result });
        }
        EngineCommand::FetchRecent { limit } => {
            let result = api.recent_jobs(limit).await;
            sink.emit(EngineEvent::RecentFetched { result });
        }
        EngineCommand::StartTimer {
            timer,
            every,
            token,
        } => run_timer(timer, every, token, sink.as_ref()).await,
    }
}

async fn run_timer(
    timer: TimerId,
    every: Duration,
    token: CancellationToken,
    sink: &dyn EventSink,
) {
    let every = every.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    wpdir_debug!("timer {timer} started, every {every:?}");

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if token.is_cancelled() {
                    break;
                }
                sink.emit(EngineEvent::TimerFired { timer });
            }
        }
    }
    wpdir_debug!("timer {timer} stopped");
}
