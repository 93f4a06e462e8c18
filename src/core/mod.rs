//! Core domain models for crewflow.
//!
//! Tasks, their completion signal and the dependency graph used to
//! validate declarative plans.

pub mod dag;
pub mod signal;
pub mod task;

pub use dag::TaskGraph;
pub use signal::CompletionSignal;
pub use task::{Task, TaskId, TaskOutcome, TaskStatus};
