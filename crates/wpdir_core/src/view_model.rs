use chrono::{DateTime, Utc};

use crate::disclosure::path_within_slug;
use crate::state::SummaryLoad;
use crate::{
    AppState, Corpus, FileContent, FileViewer, JobStatus, Language, MatchesState, SortState,
    SummaryRow, ViewerId,
};

/// Lines shown on each side of the target line in a file viewer.
pub const VIEWER_RADIUS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub job_id: String,
    pub job: Option<JobView>,
    pub job_error: Option<String>,
    pub results: ResultsView,
    pub viewers: Vec<ViewerView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub input: String,
    pub corpus: Corpus,
    pub status: JobStatus,
    pub percent: Option<u8>,
    pub queue_position: Option<u32>,
    pub matches: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobView {
    /// Seconds since the job started, measured up to completion if it has
    /// finished.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        let started = self.started_at?;
        let end = self.completed_at.unwrap_or(now);
        Some((end - started).num_seconds().max(0) as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    /// Job not completed yet: only progress is shown.
    Hidden,
    Loading,
    Failed(String),
    Empty,
    Ready(ResultPageView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPageView {
    pub total_rows: usize,
    pub page: usize,
    pub page_count: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub sort: SortState,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    /// 1-based position on the current page.
    pub number: usize,
    pub slug: String,
    pub name: String,
    pub installs: String,
    pub matches: u64,
    pub link: String,
    pub expanded: bool,
    pub detail: RowDetailView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDetailView {
    Collapsed,
    Loading,
    Failed(String),
    Empty,
    Lines(Vec<MatchLineView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLineView {
    pub path: String,
    pub line_number: u32,
    pub text: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerView {
    pub id: ViewerId,
    pub title: String,
    pub path: String,
    pub language: Language,
    pub line: u32,
    /// Set when the target line no longer exists in the fetched file.
    pub notice: Option<String>,
    pub body: ViewerBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerBody {
    Loading,
    Failed(String),
    Lines(Vec<ViewerLine>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerLine {
    pub number: u32,
    pub text: String,
    pub is_target: bool,
}

pub(crate) fn build(state: &AppState) -> AppViewModel {
    let poller = state.poller();
    let job = poller.snapshot().map(|job| JobView {
        input: job.input.clone(),
        corpus: job.corpus,
        status: job.status(),
        percent: match job.status() {
            JobStatus::Running => job.progress().map(|p| p.percent()),
            JobStatus::Completed => Some(100),
            JobStatus::Queued | JobStatus::Failed => None,
        },
        queue_position: job.queue_position(),
        matches: job.matches,
        started_at: job.started_at,
        completed_at: job.completed_at(),
    });

    let results = match (poller.snapshot().map(|job| job.status()), state.summary()) {
        (Some(JobStatus::Completed), SummaryLoad::Loaded(set)) if set.is_empty() => {
            ResultsView::Empty
        }
        (Some(JobStatus::Completed), SummaryLoad::Loaded(set)) => {
            let corpus = job.as_ref().map_or(Corpus::Plugins, |job| job.corpus);
            let rows = set
                .current_page()
                .into_iter()
                .enumerate()
                .map(|(idx, row)| row_view(state, corpus, idx + 1, row))
                .collect();
            ResultsView::Ready(ResultPageView {
                total_rows: set.len(),
                page: set.page(),
                page_count: set.page_count(),
                prev_enabled: set.has_prev(),
                next_enabled: set.has_next(),
                sort: set.sort_state(),
                rows,
            })
        }
        (Some(JobStatus::Completed), SummaryLoad::Failed(failure)) => {
            ResultsView::Failed(failure.to_string())
        }
        (Some(JobStatus::Completed), _) => ResultsView::Loading,
        _ => ResultsView::Hidden,
    };

    let viewers = state
        .viewers()
        .map(|viewer| ViewerView {
            id: viewer.id,
            title: viewer.key.slug.clone(),
            path: path_within_slug(&viewer.key.slug, &viewer.key.path).to_string(),
            language: viewer.language,
            line: viewer.line,
            notice: past_end_notice(viewer),
            body: match &viewer.content {
                FileContent::Loading => ViewerBody::Loading,
                FileContent::Failed(failure) => ViewerBody::Failed(failure.to_string()),
                FileContent::Loaded(_) => ViewerBody::Lines(
                    viewer
                        .window(VIEWER_RADIUS)
                        .into_iter()
                        .map(|(number, text)| ViewerLine {
                            number,
                            text: text.to_string(),
                            is_target: number == viewer.line,
                        })
                        .collect(),
                ),
            },
        })
        .collect();

    AppViewModel {
        job_id: poller.job_id().to_string(),
        job,
        job_error: poller.error().map(ToString::to_string),
        results,
        viewers,
    }
}

fn row_view(state: &AppState, corpus: Corpus, number: usize, row: &SummaryRow) -> RowView {
    let disclosure = state.row(&row.slug);
    let expanded = disclosure.is_some_and(|d| d.is_expanded());
    let detail = match disclosure.map(|d| d.matches()) {
        Some(_) if !expanded => RowDetailView::Collapsed,
        Some(MatchesState::Loading { .. }) => RowDetailView::Loading,
        Some(MatchesState::Failed(failure)) => RowDetailView::Failed(failure.to_string()),
        Some(MatchesState::Loaded(lines)) if lines.is_empty() => RowDetailView::Empty,
        Some(MatchesState::Loaded(lines)) => RowDetailView::Lines(
            lines
                .iter()
                .map(|line| MatchLineView {
                    path: line.display_path().to_string(),
                    line_number: line.line_number,
                    text: line.line_text.clone(),
                    before: line.before.clone(),
                    after: line.after.clone(),
                })
                .collect(),
        ),
        Some(MatchesState::Idle) | None => RowDetailView::Collapsed,
    };

    RowView {
        number,
        slug: row.slug.clone(),
        name: row.display_name().to_string(),
        installs: format_installs(row.active_installs),
        matches: row.matches,
        link: directory_link(corpus, &row.slug),
        expanded,
        detail,
    }
}

fn past_end_notice(viewer: &FileViewer) -> Option<String> {
    if !viewer.target_past_end() {
        return None;
    }
    let count = viewer.line_count().unwrap_or(0);
    Some(format!(
        "line {} is past the end of the file ({count} lines)",
        viewer.line
    ))
}

/// Thousands-separated install count; unknown counts read as "0".
pub fn format_installs(installs: Option<u64>) -> String {
    let digits = installs.unwrap_or(0).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `mm:ss`, with minutes allowed to grow past two digits.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn directory_link(corpus: Corpus, slug: &str) -> String {
    format!("https://wordpress.org/{}/{}/", corpus.as_str(), slug)
}
