use std::borrow::Cow;

use chrono::{DateTime, Utc};
use wpdir_core::{
    format_elapsed, AppViewModel, JobStatus, JobView, RecentJob, ResultPageView, ResultsView,
    RowDetailView, RowView, SortDirection, SortKey, ViewerBody, ViewerView,
};

use super::highlight::Highlighter;

const DETAIL_INDENT: &str = "        ";

/// Plain-text screen for one view model. `now` only feeds the elapsed time.
pub(crate) fn render(
    view: &AppViewModel,
    now: DateTime<Utc>,
    highlighter: Option<&Highlighter>,
) -> String {
    let mut lines = Vec::new();
    render_job(&mut lines, view, now);
    render_results(&mut lines, &view.results);
    for viewer in &view.viewers {
        render_viewer(&mut lines, viewer, highlighter);
    }
    lines.join("\n")
}

fn render_job(lines: &mut Vec<String>, view: &AppViewModel, now: DateTime<Utc>) {
    lines.push(format!("Job {}", sanitize(&view.job_id)));
    match &view.job {
        Some(job) => {
            lines.push(format!("Search \"{}\" in {}", sanitize(&job.input), job.corpus));
            lines.push(status_line(job, now));
        }
        None => lines.push("Status: waiting for the first update".to_string()),
    }
    if let Some(error) = &view.job_error {
        lines.push(format!("Last update failed: {}", sanitize(error)));
    }
}

fn status_line(job: &JobView, now: DateTime<Utc>) -> String {
    let mut parts = vec![match job.status {
        JobStatus::Queued => match job.queue_position {
            Some(position) => format!("Status: Queued (position {position})"),
            None => "Status: Queued".to_string(),
        },
        JobStatus::Running => match job.percent {
            Some(percent) => format!("Status: Running {percent}%"),
            None => "Status: Running".to_string(),
        },
        status => format!("Status: {}", status.label()),
    }];
    if let Some(secs) = job.elapsed_secs(now) {
        parts.push(format!("elapsed {}", format_elapsed(secs)));
    }
    parts.push(format!("{} matches", job.matches));
    parts.join(" | ")
}

fn render_results(lines: &mut Vec<String>, results: &ResultsView) {
    match results {
        ResultsView::Hidden => {}
        ResultsView::Loading => lines.push("Loading results...".to_string()),
        ResultsView::Failed(error) => {
            lines.push(format!("Could not load results: {}", sanitize(error)))
        }
        ResultsView::Empty => lines.push("No matches.".to_string()),
        ResultsView::Ready(page) => render_page(lines, page),
    }
}

fn render_page(lines: &mut Vec<String>, page: &ResultPageView) {
    let mut header = format!(
        "Results: {} rows | page {}/{} | sorted by {} {}",
        page.total_rows,
        page.page,
        page.page_count,
        sort_key_label(page.sort.key),
        sort_direction_label(page.sort.direction),
    );
    if page.prev_enabled {
        header.push_str(" | prev");
    }
    if page.next_enabled {
        header.push_str(" | next");
    }
    lines.push(header);
    lines.push(format!(
        "{:>4}   {:<36} {:>13} {:>8}  {}",
        "#", "Name", "Installs", "Matches", "Link"
    ));
    for row in &page.rows {
        render_row(lines, row);
    }
}

fn render_row(lines: &mut Vec<String>, row: &RowView) {
    let marker = if row.expanded { '-' } else { '+' };
    lines.push(format!(
        "{:>4} {} {:<36} {:>13} {:>8}  {}",
        row.number,
        marker,
        sanitize(&row.name),
        row.installs,
        row.matches,
        sanitize(&row.link)
    ));
    match &row.detail {
        RowDetailView::Collapsed => {}
        RowDetailView::Loading => lines.push(format!("{DETAIL_INDENT}loading matches...")),
        RowDetailView::Failed(error) => {
            lines.push(format!("{DETAIL_INDENT}could not load matches: {}", sanitize(error)))
        }
        RowDetailView::Empty => lines.push(format!("{DETAIL_INDENT}no match lines")),
        RowDetailView::Lines(matches) => {
            for (idx, line) in matches.iter().enumerate() {
                for context in &line.before {
                    lines.push(format!("{DETAIL_INDENT}      {}", sanitize(context)));
                }
                lines.push(format!(
                    "{DETAIL_INDENT}[{}] {}:{}  {}",
                    idx + 1,
                    sanitize(&line.path),
                    line.line_number,
                    sanitize(line.text.trim_end())
                ));
                for context in &line.after {
                    lines.push(format!("{DETAIL_INDENT}      {}", sanitize(context)));
                }
            }
        }
    }
}

fn render_viewer(lines: &mut Vec<String>, viewer: &ViewerView, highlighter: Option<&Highlighter>) {
    lines.push(format!(
        "--- viewer {}: {} / {} ({}), line {} ---",
        viewer.id,
        sanitize(&viewer.title),
        sanitize(&viewer.path),
        viewer.language.label(),
        viewer.line
    ));
    if let Some(notice) = &viewer.notice {
        lines.push(format!("({notice})"));
    }
    match &viewer.body {
        ViewerBody::Loading => lines.push("loading file...".to_string()),
        ViewerBody::Failed(error) => {
            lines.push(format!("could not load file: {}", sanitize(error)))
        }
        ViewerBody::Lines(body) => {
            let clean: Vec<Cow<'_, str>> = body.iter().map(|line| sanitize(&line.text)).collect();
            let raw: Vec<&str> = clean.iter().map(|text| text.as_ref()).collect();
            let texts = match highlighter {
                Some(highlighter) => highlighter.highlight(viewer.language, &raw),
                None => raw.iter().map(|text| (*text).to_string()).collect(),
            };
            for (line, text) in body.iter().zip(texts) {
                let marker = if line.is_target { '>' } else { ' ' };
                lines.push(format!("{marker}{:>6} | {text}", line.number));
            }
        }
    }
}

fn sort_key_label(key: SortKey) -> &'static str {
    match key {
        SortKey::Name => "name",
        SortKey::ActiveInstalls => "installs",
        SortKey::Matches => "matches",
    }
}

fn sort_direction_label(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "ascending",
        SortDirection::Descending => "descending",
    }
}

pub(crate) fn render_recent(jobs: &[RecentJob]) -> String {
    if jobs.is_empty() {
        return "No recent searches.".to_string();
    }
    let mut lines = vec![format!(
        "{:<28} {:<8} {:>8}  {}",
        "Id", "Corpus", "Matches", "Search"
    )];
    lines.extend(jobs.iter().map(|job| {
        format!(
            "{:<28} {:<8} {:>8}  {}",
            sanitize(&job.id),
            job.corpus.as_str(),
            job.matches,
            sanitize(&job.input)
        )
    }));
    lines.join("\n")
}

/// Replaces control characters other than tab with visible escapes, so
/// server text cannot drive the terminal.
pub(crate) fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|ch| ch.is_control() && ch != '\t') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if ch.is_control() && ch != '\t' {
            out.extend(ch.escape_default());
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use wpdir_core::{Corpus, Language, MatchLineView, SortState, ViewerLine};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 1, 15).unwrap()
    }

    fn job(status: JobStatus) -> JobView {
        JobView {
            input: "wp_remote_get".to_string(),
            corpus: Corpus::Plugins,
            status,
            percent: Some(40),
            queue_position: Some(3),
            matches: 12,
            started_at: Some(Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()),
            completed_at: None,
        }
    }

    fn view(job: Option<JobView>, results: ResultsView) -> AppViewModel {
        AppViewModel {
            job_id: "01HJOB".to_string(),
            job,
            job_error: None,
            results,
            viewers: Vec::new(),
        }
    }

    #[test]
    fn running_job_shows_percent_and_elapsed() {
        let text = render(&view(Some(job(JobStatus::Running)), ResultsView::Hidden), now(), None);
        assert_eq!(
            text,
            "Job 01HJOB\nSearch \"wp_remote_get\" in plugins\nStatus: Running 40% | elapsed 01:15 | 12 matches"
        );
    }

    #[test]
    fn queued_job_shows_position() {
        let mut queued = job(JobStatus::Queued);
        queued.started_at = None;
        let text = render(&view(Some(queued), ResultsView::Hidden), now(), None);
        assert!(text.ends_with("Status: Queued (position 3) | 12 matches"));
    }

    #[test]
    fn missing_snapshot_and_error_are_reported() {
        let mut model = view(None, ResultsView::Hidden);
        model.job_error = Some("server error (status 500)".to_string());
        let text = render(&model, now(), None);
        assert!(text.contains("waiting for the first update"));
        assert!(text.contains("Last update failed: server error (status 500)"));
    }

    #[test]
    fn expanded_row_lists_numbered_matches() {
        let page = ResultPageView {
            total_rows: 1,
            page: 1,
            page_count: 1,
            prev_enabled: false,
            next_enabled: false,
            sort: SortState {
                key: SortKey::ActiveInstalls,
                direction: SortDirection::Descending,
            },
            rows: vec![RowView {
                number: 1,
                slug: "akismet".to_string(),
                name: "Akismet".to_string(),
                installs: "5,000,000".to_string(),
                matches: 1,
                link: "https://wordpress.org/plugins/akismet/".to_string(),
                expanded: true,
                detail: RowDetailView::Lines(vec![MatchLineView {
                    path: "class.php".to_string(),
                    line_number: 42,
                    text: "wp_remote_get( $url );".to_string(),
                    before: Vec::new(),
                    after: Vec::new(),
                }]),
            }],
        };
        let text = render(
            &view(Some(job(JobStatus::Completed)), ResultsView::Ready(page)),
            now(),
            None,
        );
        assert!(text.contains("Results: 1 rows | page 1/1 | sorted by installs descending"));
        assert!(text.contains("5,000,000"));
        assert!(text.contains("[1] class.php:42  wp_remote_get( $url );"));
    }

    #[test]
    fn viewer_marks_target_line() {
        let mut model = view(None, ResultsView::Hidden);
        model.viewers.push(ViewerView {
            id: 2,
            title: "akismet".to_string(),
            path: "class.php".to_string(),
            language: Language::Php,
            line: 2,
            notice: None,
            body: ViewerBody::Lines(vec![
                ViewerLine {
                    number: 1,
                    text: "<?php".to_string(),
                    is_target: false,
                },
                ViewerLine {
                    number: 2,
                    text: "eval($x);".to_string(),
                    is_target: true,
                },
            ]),
        });
        let text = render(&model, now(), None);
        assert!(text.contains("--- viewer 2: akismet / class.php (php), line 2 ---"));
        assert!(text.contains("      1 | <?php"));
        assert!(text.contains(">     2 | eval($x);"));
    }

    #[test]
    fn recent_jobs_table() {
        assert_eq!(render_recent(&[]), "No recent searches.");
        let text = render_recent(&[RecentJob {
            id: "01HJOB".to_string(),
            input: "eval(".to_string(),
            corpus: Corpus::Themes,
            matches: 7,
        }]);
        assert!(text.lines().nth(1).unwrap().starts_with("01HJOB"));
        assert!(text.contains("themes"));
    }

    #[test]
    fn control_characters_are_shown_escaped() {
        assert_eq!(sanitize("echo\t$x;"), "echo\t$x;");
        assert!(matches!(sanitize("plain"), Cow::Borrowed(_)));

        let mut model = view(None, ResultsView::Hidden);
        model.viewers.push(ViewerView {
            id: 1,
            title: "evil\x1b[2J".to_string(),
            path: "x.php".to_string(),
            language: Language::Php,
            line: 1,
            notice: None,
            body: ViewerBody::Lines(vec![ViewerLine {
                number: 1,
                text: "\x1b]0;pwned\x07\x1b[2J".to_string(),
                is_target: true,
            }]),
        });
        let text = render(&model, now(), None);
        assert!(!text.contains('\x1b'));
        assert!(!text.contains('\x07'));
        assert!(text.contains(r">     1 | \u{1b}]0;pwned\u{7}\u{1b}[2J"));
        assert!(text.contains(r"viewer 1: evil\u{1b}[2J / x.php"));
    }

    #[test]
    fn highlighted_lines_are_escaped_first() {
        let Some(highlighter) = Highlighter::load() else {
            return;
        };
        let mut model = view(None, ResultsView::Hidden);
        model.viewers.push(ViewerView {
            id: 1,
            title: "akismet".to_string(),
            path: "x.php".to_string(),
            language: Language::Php,
            line: 1,
            notice: None,
            body: ViewerBody::Lines(vec![ViewerLine {
                number: 1,
                text: "$a = 1;\x1b]0;pwned\x07".to_string(),
                is_target: true,
            }]),
        });
        let text = render(&model, now(), Some(&highlighter));
        assert!(!text.contains('\x07'));
        assert!(!text.contains("\x1b]0;"));
    }

    #[test]
    fn viewer_shows_past_end_notice() {
        let mut model = view(None, ResultsView::Hidden);
        model.viewers.push(ViewerView {
            id: 1,
            title: "akismet".to_string(),
            path: "class.php".to_string(),
            language: Language::Php,
            line: 50,
            notice: Some("line 50 is past the end of the file (1 lines)".to_string()),
            body: ViewerBody::Lines(vec![ViewerLine {
                number: 1,
                text: "<?php".to_string(),
                is_target: false,
            }]),
        });
        let text = render(&model, now(), None);
        assert!(text.contains("(line 50 is past the end of the file (1 lines))"));
        assert!(text.contains("      1 | <?php"));
    }
}
