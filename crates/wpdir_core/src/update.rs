use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    // After teardown every late response and user action is dropped.
    if state.is_torn_down() && !matches!(msg, Msg::Teardown) {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Activated => state.activate(),
        Msg::PollTimerFired(timer) => state.poll_timer_fired(timer),
        Msg::JobFetched { seq, result } => state.apply_job(seq, result),
        Msg::SummaryFetched(result) => {
            state.apply_summary(result);
            Vec::new()
        }
        Msg::SortSelected(key) => {
            state.sort_by(key);
            Vec::new()
        }
        Msg::NextPage => {
            state.next_page();
            Vec::new()
        }
        Msg::PrevPage => {
            state.prev_page();
            Vec::new()
        }
        Msg::RowToggled { slug } => state.toggle_row(&slug),
        Msg::MatchesFetched {
            slug,
            request,
            result,
        } => {
            state.apply_matches(&slug, request, result);
            Vec::new()
        }
        Msg::ViewMatch { slug, index } => state.view_match(&slug, index),
        Msg::FileFetched { viewer, result } => {
            state.apply_file(viewer, result);
            Vec::new()
        }
        Msg::ViewerClosed { viewer } => {
            state.close_viewer(viewer);
            Vec::new()
        }
        Msg::Teardown => state.teardown(),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
