//! Line commands typed while a job is being watched.

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use wpdir_core::{AppViewModel, Msg, ResultsView, RowDetailView, SortKey, ViewerId};

use super::app::LoopEvent;

pub(crate) const HELP: &str = "commands: sort name|installs|matches, next, prev, open <row>, \
view <row> <match>, close <viewer>, help, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Sort(SortKey),
    Next,
    Prev,
    Open { row: usize },
    View { row: usize, line: usize },
    Close { viewer: ViewerId },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum InputError {
    #[error("unknown command `{0}`, type `help` for the list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("results are not available yet")]
    NoResults,
    #[error("there is no row {0} on this page")]
    NoSuchRow(usize),
    #[error("row {0} has no loaded match {1}; open the row first")]
    NoSuchMatch(usize, usize),
    #[error("there is no viewer {0}")]
    NoSuchViewer(ViewerId),
}

/// Reads stdin on its own thread until it closes or the loop goes away.
pub(crate) fn spawn_reader(loop_tx: mpsc::Sender<LoopEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if loop_tx.send(LoopEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = loop_tx.send(LoopEvent::InputClosed);
    });
}

/// Parses one input line. Blank lines yield `None`.
pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, InputError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("sort", [key]) => Command::Sort(parse_sort_key(key)?),
        ("sort", _) => return Err(InputError::Usage("sort name|installs|matches")),
        ("next" | "n", []) => Command::Next,
        ("prev" | "p", []) => Command::Prev,
        ("open" | "o", [row]) => Command::Open {
            row: parse_number(row, "open <row>")?,
        },
        ("open" | "o", _) => return Err(InputError::Usage("open <row>")),
        ("view" | "v", [row, line]) => Command::View {
            row: parse_number(row, "view <row> <match>")?,
            line: parse_number(line, "view <row> <match>")?,
        },
        ("view" | "v", _) => return Err(InputError::Usage("view <row> <match>")),
        ("close" | "c", [viewer]) => Command::Close {
            viewer: parse_number(viewer, "close <viewer>")? as ViewerId,
        },
        ("close" | "c", _) => return Err(InputError::Usage("close <viewer>")),
        ("help" | "?", _) => Command::Help,
        ("quit" | "q" | "exit", _) => Command::Quit,
        _ => return Err(InputError::Unknown(line.trim().to_string())),
    };
    Ok(Some(command))
}

fn parse_sort_key(raw: &str) -> Result<SortKey, InputError> {
    match raw.to_ascii_lowercase().as_str() {
        "name" => Ok(SortKey::Name),
        "installs" | "active_installs" => Ok(SortKey::ActiveInstalls),
        "matches" => Ok(SortKey::Matches),
        _ => Err(InputError::Usage("sort name|installs|matches")),
    }
}

fn parse_number(raw: &str, usage: &'static str) -> Result<usize, InputError> {
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(InputError::Usage(usage)),
    }
}

/// Resolves page-relative numbers against what is currently on screen.
/// `Help` and `Quit` are handled by the loop and never reach here.
pub(crate) fn command_to_msg(command: Command, view: &AppViewModel) -> Result<Msg, InputError> {
    match command {
        Command::Sort(key) => {
            ready_rows(view)?;
            Ok(Msg::SortSelected(key))
        }
        Command::Next => Ok(Msg::NextPage),
        Command::Prev => Ok(Msg::PrevPage),
        Command::Open { row } => {
            let slug = row_slug(view, row)?;
            Ok(Msg::RowToggled { slug })
        }
        Command::View { row, line } => {
            let rows = ready_rows(view)?;
            let target = rows
                .iter()
                .find(|candidate| candidate.number == row)
                .ok_or(InputError::NoSuchRow(row))?;
            match &target.detail {
                RowDetailView::Lines(lines) if line <= lines.len() => Ok(Msg::ViewMatch {
                    slug: target.slug.clone(),
                    index: line - 1,
                }),
                _ => Err(InputError::NoSuchMatch(row, line)),
            }
        }
        Command::Close { viewer } => {
            if view.viewers.iter().any(|open| open.id == viewer) {
                Ok(Msg::ViewerClosed { viewer })
            } else {
                Err(InputError::NoSuchViewer(viewer))
            }
        }
        Command::Help | Command::Quit => Ok(Msg::NoOp),
    }
}

fn ready_rows(view: &AppViewModel) -> Result<&[wpdir_core::RowView], InputError> {
    match &view.results {
        ResultsView::Ready(page) => Ok(&page.rows),
        _ => Err(InputError::NoResults),
    }
}

fn row_slug(view: &AppViewModel, row: usize) -> Result<String, InputError> {
    ready_rows(view)?
        .iter()
        .find(|candidate| candidate.number == row)
        .map(|candidate| candidate.slug.clone())
        .ok_or(InputError::NoSuchRow(row))
}
