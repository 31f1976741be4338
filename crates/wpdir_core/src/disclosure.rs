use crate::job::{FetchFailure, JobId};
use crate::results::CollapseSignal;

/// One concrete match inside a summary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLine {
    pub slug: String,
    pub file: String,
    pub line_number: u32,
    pub line_text: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

impl MatchLine {
    /// File path relative to the plugin/theme directory.
    pub fn display_path(&self) -> &str {
        path_within_slug(&self.slug, &self.file)
    }
}

/// Strips a leading `slug/` directory; other paths are returned unchanged.
pub(crate) fn path_within_slug<'a>(slug: &str, path: &'a str) -> &'a str {
    path.strip_prefix(slug)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchesState {
    Idle,
    Loading { request: u64 },
    Loaded(Vec<MatchLine>),
    Failed(FetchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFetch {
    pub job_id: JobId,
    pub slug: String,
    pub request: u64,
}

/// Expand/collapse state for a single summary row.
///
/// Collapsing does not cancel an in-flight fetch. Its response carries a
/// request token that no longer matches, so it is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDisclosure {
    job_id: JobId,
    slug: String,
    expanded: bool,
    matches: MatchesState,
    next_request: u64,
    seen_collapse: u64,
}

impl RowDisclosure {
    pub fn new(job_id: impl Into<JobId>, slug: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            slug: slug.into(),
            expanded: false,
            matches: MatchesState::Idle,
            next_request: 0,
            seen_collapse: 0,
        }
    }

    /// Starts expanded; the caller must issue the returned fetch.
    pub fn new_expanded(
        job_id: impl Into<JobId>,
        slug: impl Into<String>,
    ) -> (Self, MatchFetch) {
        let mut row = Self::new(job_id, slug);
        let fetch = row.expand();
        (row, fetch)
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn matches(&self) -> &MatchesState {
        &self.matches
    }

    /// Flips the row. Expanding yields exactly one fetch.
    pub fn toggle(&mut self) -> Option<MatchFetch> {
        if self.expanded {
            self.collapse();
            None
        } else {
            Some(self.expand())
        }
    }

    /// Observes a collapse-all signal. A generation is acted on once; this
    /// never issues a fetch. Returns whether the row changed.
    pub fn observe(&mut self, signal: CollapseSignal) -> bool {
        if signal.generation() <= self.seen_collapse {
            return false;
        }
        self.seen_collapse = signal.generation();
        let was_expanded = self.expanded;
        self.collapse();
        was_expanded
    }

    /// Applies a match-line response. Only the response to the current
    /// expansion is accepted.
    pub fn matches_loaded(
        &mut self,
        request: u64,
        result: Result<Vec<MatchLine>, FetchFailure>,
    ) -> bool {
        match self.matches {
            MatchesState::Loading { request: pending } if self.expanded && pending == request => {}
            _ => return false,
        }
        self.matches = match result {
            Ok(lines) => MatchesState::Loaded(lines),
            Err(failure) => MatchesState::Failed(failure),
        };
        true
    }

    fn expand(&mut self) -> MatchFetch {
        self.expanded = true;
        self.next_request += 1;
        self.matches = MatchesState::Loading {
            request: self.next_request,
        };
        MatchFetch {
            job_id: self.job_id.clone(),
            slug: self.slug.clone(),
            request: self.next_request,
        }
    }

    fn collapse(&mut self) {
        self.expanded = false;
        self.matches = MatchesState::Idle;
    }
}
