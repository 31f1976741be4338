use crate::{FetchFailure, Job, MatchLine, PollTimer, SortKey, SummaryRow, ViewerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The job view was mounted; start tracking.
    Activated,
    /// One of the repeating poll timers fired.
    PollTimerFired(PollTimer),
    /// Status fetch finished.
    JobFetched {
        seq: u64,
        result: Result<Job, FetchFailure>,
    },
    /// Summary fetch finished.
    SummaryFetched(Result<Vec<SummaryRow>, FetchFailure>),
    /// User picked a sort column.
    SortSelected(SortKey),
    NextPage,
    PrevPage,
    /// User clicked a summary row.
    RowToggled { slug: String },
    /// Match-line fetch for one row finished.
    MatchesFetched {
        slug: String,
        request: u64,
        result: Result<Vec<MatchLine>, FetchFailure>,
    },
    /// User asked to see the file behind the `index`-th match of a row.
    ViewMatch { slug: String, index: usize },
    /// File-content fetch for one viewer finished.
    FileFetched {
        viewer: ViewerId,
        result: Result<String, FetchFailure>,
    },
    ViewerClosed { viewer: ViewerId },
    /// The job view is going away; stop everything.
    Teardown,
    NoOp,
}
