use std::collections::BTreeMap;

use crate::poller::{JobPoller, PollEffect, PollIntervals};
use crate::view_model::{self, AppViewModel};
use crate::{
    CollapseSignal, Effect, FetchFailure, FileKey, FileViewer, Job, JobId, MatchLine,
    MatchesState, ResultSet, RowDisclosure, SortKey, SummaryRow, ViewerId, PAGE_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryLoad {
    NotRequested,
    Loading,
    Loaded(ResultSet),
    Failed(FetchFailure),
}

/// Everything the job view owns: the poller, the result set once the job
/// completes, one disclosure per summary row and the open file viewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    poller: JobPoller,
    summary: SummaryLoad,
    rows: BTreeMap<String, RowDisclosure>,
    viewers: BTreeMap<ViewerId, FileViewer>,
    next_viewer: ViewerId,
    page_size: usize,
    dirty: bool,
}

impl AppState {
    pub fn new(job_id: impl Into<JobId>, intervals: PollIntervals) -> Self {
        Self::with_page_size(job_id, intervals, PAGE_SIZE)
    }

    pub fn with_page_size(
        job_id: impl Into<JobId>,
        intervals: PollIntervals,
        page_size: usize,
    ) -> Self {
        Self {
            poller: JobPoller::new(job_id, intervals),
            summary: SummaryLoad::NotRequested,
            rows: BTreeMap::new(),
            viewers: BTreeMap::new(),
            next_viewer: 1,
            page_size,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        view_model::build(self)
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    pub fn summary(&self) -> &SummaryLoad {
        &self.summary
    }

    pub fn row(&self, slug: &str) -> Option<&RowDisclosure> {
        self.rows.get(slug)
    }

    pub fn viewers(&self) -> impl Iterator<Item = &FileViewer> + '_ {
        self.viewers.values()
    }

    pub fn viewer(&self, id: ViewerId) -> Option<&FileViewer> {
        self.viewers.get(&id)
    }

    pub fn is_torn_down(&self) -> bool {
        self.poller.is_torn_down()
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn activate(&mut self) -> Vec<Effect> {
        let effects = map_poll_effects(self.poller.activate());
        if !effects.is_empty() {
            self.mark_dirty();
        }
        effects
    }

    pub(crate) fn poll_timer_fired(&mut self, timer: crate::PollTimer) -> Vec<Effect> {
        map_poll_effects(self.poller.timer_fired(timer))
    }

    pub(crate) fn apply_job(&mut self, seq: u64, result: Result<Job, FetchFailure>) -> Vec<Effect> {
        let before = (self.poller.snapshot().cloned(), self.poller.error().cloned());
        let mut effects = map_poll_effects(self.poller.fetch_completed(seq, result));
        let after = (self.poller.snapshot().cloned(), self.poller.error().cloned());
        if before != after {
            self.mark_dirty();
        }

        let completed = self
            .poller
            .snapshot()
            .is_some_and(|job| job.status() == crate::JobStatus::Completed);
        if completed && self.summary == SummaryLoad::NotRequested {
            self.summary = SummaryLoad::Loading;
            self.mark_dirty();
            effects.push(Effect::FetchSummary {
                job_id: self.poller.job_id().to_string(),
            });
        }
        effects
    }

    pub(crate) fn apply_summary(&mut self, result: Result<Vec<SummaryRow>, FetchFailure>) {
        if self.summary != SummaryLoad::Loading {
            return;
        }
        self.summary = match result {
            Ok(rows) => {
                let job_id = self.poller.job_id().to_string();
                self.rows = rows
                    .iter()
                    .map(|row| (row.slug.clone(), RowDisclosure::new(job_id.clone(), &row.slug)))
                    .collect();
                SummaryLoad::Loaded(ResultSet::with_page_size(rows, self.page_size))
            }
            Err(failure) => SummaryLoad::Failed(failure),
        };
        self.mark_dirty();
    }

    pub(crate) fn sort_by(&mut self, key: SortKey) {
        let SummaryLoad::Loaded(set) = &mut self.summary else {
            return;
        };
        let signal = set.sort_by(key);
        self.broadcast_collapse(signal);
        self.mark_dirty();
    }

    pub(crate) fn next_page(&mut self) {
        if let SummaryLoad::Loaded(set) = &mut self.summary {
            if set.next_page() {
                self.dirty = true;
            }
        }
    }

    pub(crate) fn prev_page(&mut self) {
        if let SummaryLoad::Loaded(set) = &mut self.summary {
            if set.prev_page() {
                self.dirty = true;
            }
        }
    }

    pub(crate) fn toggle_row(&mut self, slug: &str) -> Vec<Effect> {
        let Some(row) = self.rows.get_mut(slug) else {
            return Vec::new();
        };
        let fetch = row.toggle();
        self.mark_dirty();
        fetch
            .map(|fetch| Effect::FetchMatches {
                job_id: fetch.job_id,
                slug: fetch.slug,
                request: fetch.request,
            })
            .into_iter()
            .collect()
    }

    pub(crate) fn apply_matches(
        &mut self,
        slug: &str,
        request: u64,
        result: Result<Vec<MatchLine>, FetchFailure>,
    ) {
        if let Some(row) = self.rows.get_mut(slug) {
            if row.matches_loaded(request, result) {
                self.dirty = true;
            }
        }
    }

    pub(crate) fn view_match(&mut self, slug: &str, index: usize) -> Vec<Effect> {
        let Some(corpus) = self.poller.snapshot().map(|job| job.corpus) else {
            return Vec::new();
        };
        let Some(line) = self.rows.get(slug).and_then(|row| match row.matches() {
            MatchesState::Loaded(lines) if row.is_expanded() => lines.get(index).cloned(),
            _ => None,
        }) else {
            return Vec::new();
        };

        let id = self.next_viewer;
        self.next_viewer += 1;
        let key = FileKey {
            corpus,
            slug: slug.to_string(),
            path: line.file,
        };
        self.viewers
            .insert(id, FileViewer::open(id, key.clone(), line.line_number));
        self.mark_dirty();
        vec![Effect::FetchFile { viewer: id, key }]
    }

    pub(crate) fn apply_file(&mut self, viewer: ViewerId, result: Result<String, FetchFailure>) {
        if let Some(open) = self.viewers.get_mut(&viewer) {
            if open.content_loaded(result) {
                self.dirty = true;
            }
        }
    }

    pub(crate) fn close_viewer(&mut self, viewer: ViewerId) {
        if self.viewers.remove(&viewer).is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn teardown(&mut self) -> Vec<Effect> {
        let effects = map_poll_effects(self.poller.teardown());
        if !effects.is_empty() {
            self.mark_dirty();
        }
        effects
    }

    fn broadcast_collapse(&mut self, signal: CollapseSignal) {
        for row in self.rows.values_mut() {
            row.observe(signal);
        }
    }
}

fn map_poll_effects(effects: Vec<PollEffect>) -> Vec<Effect> {
    effects
        .into_iter()
        .map(|effect| match effect {
            PollEffect::FetchStatus { job_id, seq } => Effect::FetchJob { job_id, seq },
            PollEffect::StartTimer { timer, every } => Effect::StartPollTimer { timer, every },
            PollEffect::CancelTimer { timer } => Effect::CancelPollTimer { timer },
        })
        .collect()
}
