//! Search client core: pure state machines and view-model helpers.
mod disclosure;
mod effect;
mod job;
mod msg;
mod poller;
mod results;
mod state;
mod update;
mod view_model;
mod viewer;

pub use disclosure::{MatchFetch, MatchLine, MatchesState, RowDisclosure};
pub use effect::Effect;
pub use job::{Corpus, FetchFailure, Job, JobId, JobPhase, JobStatus, Progress, RecentJob};
pub use msg::Msg;
pub use poller::{JobPoller, PollEffect, PollIntervals, PollTimer};
pub use results::{
    CollapseSignal, ResultSet, SortDirection, SortKey, SortState, SummaryRow, PAGE_SIZE,
};
pub use state::{AppState, SummaryLoad};
pub use update::update;
pub use view_model::{
    directory_link, format_elapsed, format_installs, AppViewModel, JobView, MatchLineView,
    ResultPageView, ResultsView, RowDetailView, RowView, ViewerBody, ViewerLine, ViewerView,
    VIEWER_RADIUS,
};
pub use viewer::{infer_language, FileContent, FileKey, FileViewer, Language, ViewerId};
