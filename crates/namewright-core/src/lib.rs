//! namewright core: rename planning and execution.
//!
//! This crate contains all business logic with zero frontend dependencies.
//! It is designed to be reusable across different frontends (CLI, TUI, GUI).
//!
//! # Modules
//!
//! - [`model`]: Scanned entries, proposed renames, operations and settings.
//! - [`scanner`]: Builds a fully materialised entry tree from root paths.
//! - [`transform`]: User-authored transforms (pipeline DSL) behind a future-returning interface.
//! - [`replace`]: Literal matcher, regex strategy, per-walk counters and the composer.
//! - [`planner`]: Pre-order walk producing proposed renames, sync, async and on a worker.
//! - [`executor`]: Applies a selected subset of renames to the filesystem.
pub mod executor;
pub mod model;
pub mod planner;
pub mod replace;
pub mod scanner;
pub mod transform;
