use std::sync::mpsc;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use wpdir_core::{update, AppState, AppViewModel, Msg, PollIntervals, ResultsView};
use wpdir_engine::{ClientConfig, EngineEvent, EngineHandle};
use wpdir_logging::{wpdir_debug, wpdir_info};

use super::effects::{fetch_failure, recent_jobs, EffectRunner};
use super::input::{self, Command, HELP};
use super::ui::highlight::Highlighter;
use super::ui::render::{render, render_recent};

/// Everything the watch loop reacts to.
pub(crate) enum LoopEvent {
    Core(Msg),
    Line(String),
    InputClosed,
}

/// Tracks one job until the user quits. Once stdin closes the loop keeps
/// running until the job has settled, so piped runs still print results.
pub fn run_watch(
    config: ClientConfig,
    intervals: PollIntervals,
    job_id: String,
    highlight: bool,
) -> anyhow::Result<()> {
    let (loop_tx, loop_rx) = mpsc::channel();
    let runner = EffectRunner::new(config, loop_tx.clone())
        .context("failed to start the request engine")?;
    input::spawn_reader(loop_tx);
    let highlighter = if highlight { Highlighter::load() } else { None };

    wpdir_info!("watching job {job_id}");
    println!("{HELP}");
    let mut state = dispatch(
        AppState::new(job_id, intervals),
        Msg::Activated,
        &runner,
        highlighter.as_ref(),
    );

    let mut input_open = true;
    while let Ok(event) = loop_rx.recv() {
        match event {
            LoopEvent::Core(msg) => {
                state = dispatch(state, msg, &runner, highlighter.as_ref());
            }
            LoopEvent::Line(line) => match input::parse_command(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(Command::Help)) => println!("{HELP}"),
                Ok(Some(command)) => match input::command_to_msg(command, &state.view()) {
                    Ok(msg) => state = dispatch(state, msg, &runner, highlighter.as_ref()),
                    Err(err) => println!("{err}"),
                },
                Err(err) => println!("{err}"),
            },
            LoopEvent::InputClosed => {
                wpdir_debug!("stdin closed");
                input_open = false;
            }
        }
        if !input_open && is_settled(&state.view()) {
            break;
        }
    }

    let _ = dispatch(state, Msg::Teardown, &runner, highlighter.as_ref());
    runner.shutdown();
    Ok(())
}

pub fn run_recent(config: ClientConfig, count: usize) -> anyhow::Result<()> {
    let wait = config.connect_timeout + config.request_timeout;
    let engine = EngineHandle::new(config).context("failed to start the request engine")?;
    engine.fetch_recent(count);

    match engine.recv_timeout(wait) {
        Some(EngineEvent::RecentFetched { result }) => {
            let payloads = result
                .map_err(fetch_failure)
                .map_err(|failure| anyhow!("could not list recent searches: {failure}"))?;
            println!("{}", render_recent(&recent_jobs(payloads)));
            Ok(())
        }
        _ => bail!("no answer from the server within {wait:?}"),
    }
}

fn dispatch(
    state: AppState,
    msg: Msg,
    runner: &EffectRunner,
    highlighter: Option<&Highlighter>,
) -> AppState {
    let (mut state, effects) = update(state, msg);
    runner.run(effects);
    if state.consume_dirty() {
        println!("\n{}", render(&state.view(), Utc::now(), highlighter));
    }
    state
}

fn is_settled(view: &AppViewModel) -> bool {
    let terminal = view
        .job
        .as_ref()
        .is_some_and(|job| job.status.is_terminal());
    terminal && !matches!(view.results, ResultsView::Loading)
}
