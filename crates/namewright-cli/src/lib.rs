//! namewright CLI: headless frontend over `namewright-core`.
//!
//! Session state, argument parsing, presets and report rendering live here.
//! Rename planning and execution live in `namewright-core`.
pub mod app;
pub mod cli;
pub mod preset;
pub mod report;
pub mod state;

pub use app::run;
pub use cli::Cli;
pub use state::{RenameSession, SessionPhase};
