use wpdir_core::{
    CollapseSignal, FetchFailure, MatchLine, MatchesState, ResultSet, RowDisclosure, SortKey,
    SummaryRow,
};

fn line(n: u32) -> MatchLine {
    MatchLine {
        slug: "akismet".to_string(),
        file: "akismet/akismet.php".to_string(),
        line_number: n,
        line_text: format!("eval($x{n});"),
        before: Vec::new(),
        after: Vec::new(),
    }
}

fn signal_from_sort() -> CollapseSignal {
    let mut set = ResultSet::new(vec![SummaryRow {
        slug: "akismet".to_string(),
        name: None,
        active_installs: None,
        matches: 1,
    }]);
    set.sort_by(SortKey::Matches)
}

#[test]
fn expanding_issues_exactly_one_fetch() {
    let mut row = RowDisclosure::new("abc123", "akismet");
    assert!(!row.is_expanded());

    let fetch = row.toggle().expect("fetch on expand");
    assert_eq!(fetch.job_id, "abc123");
    assert_eq!(fetch.slug, "akismet");
    assert!(row.is_expanded());
    assert_eq!(row.matches(), &MatchesState::Loading { request: fetch.request });

    assert!(row.toggle().is_none());
    assert!(!row.is_expanded());
}

#[test]
fn new_expanded_starts_loading() {
    let (row, fetch) = RowDisclosure::new_expanded("abc123", "akismet");
    assert!(row.is_expanded());
    assert_eq!(row.matches(), &MatchesState::Loading { request: fetch.request });
}

#[test]
fn loaded_lines_are_kept_while_expanded() {
    let mut row = RowDisclosure::new("abc123", "akismet");
    let fetch = row.toggle().unwrap();

    assert!(row.matches_loaded(fetch.request, Ok(vec![line(1), line(2)])));
    assert_eq!(row.matches(), &MatchesState::Loaded(vec![line(1), line(2)]));
}

#[test]
fn response_after_collapse_does_not_resurrect() {
    let mut row = RowDisclosure::new("abc123", "akismet");
    let fetch = row.toggle().unwrap();
    row.toggle();

    assert!(!row.matches_loaded(fetch.request, Ok(vec![line(1)])));
    assert!(!row.is_expanded());
    assert_eq!(row.matches(), &MatchesState::Idle);
}

#[test]
fn response_for_earlier_expansion_is_dropped() {
    let mut row = RowDisclosure::new("abc123", "akismet");
    let first = row.toggle().unwrap();
    row.toggle();
    let second = row.toggle().unwrap();
    assert_ne!(first.request, second.request);

    assert!(!row.matches_loaded(first.request, Ok(vec![line(1)])));
    assert_eq!(row.matches(), &MatchesState::Loading { request: second.request });

    assert!(row.matches_loaded(second.request, Ok(vec![line(2)])));
    assert_eq!(row.matches(), &MatchesState::Loaded(vec![line(2)]));
}

#[test]
fn failure_is_scoped_to_the_row() {
    let mut failing = RowDisclosure::new("abc123", "akismet");
    let mut sibling = RowDisclosure::new("abc123", "jetpack");
    let failing_fetch = failing.toggle().unwrap();
    let sibling_fetch = sibling.toggle().unwrap();

    failing.matches_loaded(failing_fetch.request, Err(FetchFailure::Server { status: 500 }));
    sibling.matches_loaded(sibling_fetch.request, Ok(vec![line(3)]));

    assert_eq!(
        failing.matches(),
        &MatchesState::Failed(FetchFailure::Server { status: 500 })
    );
    assert_eq!(sibling.matches(), &MatchesState::Loaded(vec![line(3)]));
}

#[test]
fn collapse_signal_closes_rows_without_fetching() {
    let mut a = RowDisclosure::new("abc123", "akismet");
    let mut b = RowDisclosure::new("abc123", "jetpack");
    a.toggle();
    b.toggle();

    let signal = signal_from_sort();
    assert!(a.observe(signal));
    assert!(b.observe(signal));
    assert!(!a.is_expanded());
    assert!(!b.is_expanded());
    assert_eq!(a.matches(), &MatchesState::Idle);
}

#[test]
fn collapse_signal_is_consumed_once() {
    let mut row = RowDisclosure::new("abc123", "akismet");
    let signal = signal_from_sort();
    assert!(!row.observe(signal));

    // Expanding after the signal was seen, then re-rendering with the same
    // signal, leaves the row open.
    row.toggle();
    assert!(!row.observe(signal));
    assert!(row.is_expanded());
}
