//! crewflow: a dependency-aware concurrent task executor.
//!
//! A [`Crew`] holds named agents and tasks. Each task is wired to one agent
//! and to the tasks it depends on. [`Crew::kickoff`] runs every task in its
//! own unit: a unit waits for its dependencies to finish, runs its agent with
//! the task description and the finished dependencies, then publishes the
//! outcome so dependents can start.

pub mod agent;
pub mod config;
pub mod core;
pub mod crew;
pub mod error;
pub mod log;
pub mod orchestration;
pub mod plan;
pub mod util;

pub use agent::{Agent, AgentError, AgentResult, CommandAgent, FnAgent};
pub use crate::core::{Task, TaskId, TaskOutcome, TaskStatus};
pub use crew::Crew;
pub use error::{Error, Result};
pub use orchestration::{CrewEvent, CrewOutput, TaskReport};
pub use plan::CrewPlan;
