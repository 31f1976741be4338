mod app;
mod effects;
mod input;
mod ui;

pub use app::{run_recent, run_watch};
