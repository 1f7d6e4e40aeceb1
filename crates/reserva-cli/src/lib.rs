//! Reserva CLI library.
//!
//! The binary in `main.rs` is a thin shell over these modules so the
//! pipeline orchestration stays testable.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod pipeline;
pub mod summary;

pub use cli::{Cli, Command, RunArgs, ShowConfigArgs};
pub use pipeline::{RunSummary, run_pipeline};
