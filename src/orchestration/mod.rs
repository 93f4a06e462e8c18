//! Orchestration layer: the kickoff engine and its reporting types.

mod scheduler;

pub use scheduler::{CrewEvent, CrewOutput, Scheduler, TaskReport};
