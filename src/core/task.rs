//! Task data model for the crew.
//!
//! Tasks are the units of work assigned to agents. A task is built
//! unwired, then wired to its agent and dependencies when a
//! [`Crew`](crate::crew::Crew) registers it. During kickoff its outcome is
//! published exactly once, after which its completion signal fires.

use crate::agent::Agent;
use crate::core::signal::CompletionSignal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Unique identifier for a task.
///
/// Uses UUID v4 for generation and provides a short form display
/// for human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new unique task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final result of running a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TaskOutcome {
    /// The agent returned a value.
    Succeeded {
        /// Value produced by the agent.
        output: String,
    },
    /// The agent returned an error or panicked.
    Failed {
        /// Error message describing the failure.
        error: String,
    },
    /// The agent was never invoked because a dependency did not succeed.
    Skipped {
        /// Name of the first dependency that did not succeed.
        dependency: String,
    },
}

impl TaskOutcome {
    /// The produced value, if the task succeeded.
    pub fn output(&self) -> Option<&str> {
        match self {
            TaskOutcome::Succeeded { output } => Some(output),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded { .. })
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutcome::Succeeded { output } => write!(f, "{}", output),
            TaskOutcome::Failed { error } => write!(f, "failed: {}", error),
            TaskOutcome::Skipped { dependency } => {
                write!(f, "skipped: dependency {} did not succeed", dependency)
            }
        }
    }
}

/// Task status in its lifecycle.
///
/// Derived from the task's write-once cells, so reading it never blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TaskStatus {
    /// Waiting for kickoff or for dependencies.
    Pending,
    /// The agent is executing.
    Running,
    /// Task completed successfully.
    Completed,
    /// Task failed with an error.
    Failed {
        /// Error message describing the failure.
        error: String,
    },
    /// Task skipped because a dependency did not succeed.
    Skipped {
        /// The dependency that did not succeed.
        dependency: String,
    },
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed { error } => write!(f, "failed: {}", error),
            TaskStatus::Skipped { dependency } => write!(f, "skipped: {}", dependency),
        }
    }
}

/// A single unit of work.
///
/// The agent and dependencies are fixed once the task is registered with a
/// crew; the outcome and timestamps are single-assignment cells that are
/// safe to read concurrently with the one publishing write.
pub struct Task {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// Name of the task, unique within a crew.
    pub name: String,
    /// Input handed to the agent.
    pub description: String,
    agent: Option<Arc<dyn Agent>>,
    dependencies: Vec<Arc<Task>>,
    outcome: OnceLock<TaskOutcome>,
    started_at: OnceLock<DateTime<Utc>>,
    finished_at: OnceLock<DateTime<Utc>>,
    /// Set by the first kickoff that takes ownership of running the task.
    claimed: AtomicBool,
    completion: CompletionSignal,
}

impl Task {
    /// Create a new, unwired task with the given name and description.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: TaskId::new(),
            name: name.to_string(),
            description: description.to_string(),
            agent: None,
            dependencies: Vec::new(),
            outcome: OnceLock::new(),
            started_at: OnceLock::new(),
            finished_at: OnceLock::new(),
            claimed: AtomicBool::new(false),
            completion: CompletionSignal::new(),
        }
    }

    /// Bind the task to its agent and resolved dependencies.
    ///
    /// Allocates a fresh, unfired completion signal.
    pub(crate) fn wire(mut self, agent: Arc<dyn Agent>, dependencies: Vec<Arc<Task>>) -> Self {
        self.agent = Some(agent);
        self.dependencies = dependencies;
        self.completion = CompletionSignal::new();
        self
    }

    /// The agent executing this task (set once registered).
    pub fn agent(&self) -> Option<&Arc<dyn Agent>> {
        self.agent.as_ref()
    }

    pub fn agent_name(&self) -> Option<&str> {
        self.agent.as_ref().map(|a| a.name())
    }

    /// Prerequisite tasks, in registration order.
    pub fn dependencies(&self) -> &[Arc<Task>] {
        &self.dependencies
    }

    /// The value produced by the agent, once the task has succeeded.
    pub fn output(&self) -> Option<&str> {
        self.outcome.get().and_then(TaskOutcome::output)
    }

    /// The published outcome, if the task has finished.
    pub fn outcome(&self) -> Option<&TaskOutcome> {
        self.outcome.get()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at.get().copied()
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at.get().copied()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> TaskStatus {
        match self.outcome.get() {
            Some(TaskOutcome::Succeeded { .. }) => TaskStatus::Completed,
            Some(TaskOutcome::Failed { error }) => TaskStatus::Failed {
                error: error.clone(),
            },
            Some(TaskOutcome::Skipped { dependency }) => TaskStatus::Skipped {
                dependency: dependency.clone(),
            },
            None if self.started_at.get().is_some() => TaskStatus::Running,
            None => TaskStatus::Pending,
        }
    }

    /// Check if the task has published an outcome.
    pub fn is_finished(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Check if the task finished successfully.
    pub fn succeeded(&self) -> bool {
        self.outcome.get().is_some_and(TaskOutcome::is_success)
    }

    /// The task's completion signal.
    pub fn completion(&self) -> &CompletionSignal {
        &self.completion
    }

    /// Wait until the task has published its outcome.
    pub async fn wait(&self) {
        self.completion.wait().await
    }

    /// Take ownership of running this task.
    ///
    /// Returns `true` for exactly one caller over the task's lifetime.
    pub(crate) fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn mark_started(&self) {
        let _ = self.started_at.set(Utc::now());
    }

    /// Publish the outcome and fire the completion signal.
    ///
    /// Returns `false` if an outcome had already been published; the earlier
    /// outcome is kept.
    pub(crate) fn publish(&self, outcome: TaskOutcome) -> bool {
        let _ = self.finished_at.set(Utc::now());
        let published = self.outcome.set(outcome).is_ok();
        self.completion.fire();
        published
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dependencies: Vec<&str> = self.dependencies.iter().map(|d| d.name.as_str()).collect();
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("agent", &self.agent_name())
            .field("dependencies", &dependencies)
            .field("status", &self.status())
            .finish()
    }
}
