//! Kickoff engine for concurrent task execution.
//!
//! The Scheduler spawns one unit per task. A unit waits on its dependencies'
//! completion signals, runs its agent on the blocking pool, publishes the
//! outcome and fires its own signal. Waiting pairwise on dependencies yields
//! a valid topological execution order without a separate sort.

use crate::core::task::{Task, TaskOutcome};
use crate::error::{Error, Result};
use crate::util::{self, Blocking};
use crate::{clog, clog_debug, clog_trace, clog_warn};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Events emitted during kickoff for task lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrewEvent {
    /// A task's dependencies finished and its agent was invoked.
    TaskStarted {
        /// The task that started.
        task: String,
        /// The agent executing it.
        agent: String,
    },
    /// A task's agent returned a value.
    TaskCompleted {
        /// The task that completed.
        task: String,
    },
    /// A task's agent returned an error or panicked.
    TaskFailed {
        /// The task that failed.
        task: String,
        /// Error message describing the failure.
        error: String,
    },
    /// A task was not run because a dependency did not succeed.
    TaskSkipped {
        /// The task that was skipped.
        task: String,
        /// The dependency that did not succeed.
        dependency: String,
    },
    /// Every unit of the kickoff has finished.
    AllTasksComplete,
}

/// Per-task entry of a [`CrewOutput`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub name: String,
    pub agent: Option<String>,
    pub outcome: TaskOutcome,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Summary of a kickoff, with tasks in registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Wall-clock time of the kickoff.
    pub elapsed: Duration,
    pub tasks: Vec<TaskReport>,
}

impl CrewOutput {
    fn collect(tasks: &[Arc<Task>], elapsed: Duration) -> Self {
        let tasks = tasks
            .iter()
            .filter_map(|task| {
                task.outcome().map(|outcome| TaskReport {
                    name: task.name.clone(),
                    agent: task.agent_name().map(str::to_string),
                    outcome: outcome.clone(),
                    started_at: task.started_at(),
                    finished_at: task.finished_at(),
                })
            })
            .collect();
        Self { elapsed, tasks }
    }

    pub fn get(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|report| report.name == name)
    }

    /// Output of a succeeded task.
    pub fn output(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|report| report.outcome.output())
    }

    pub fn succeeded_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Succeeded { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Failed { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, TaskOutcome::Skipped { .. }))
    }

    /// True when every task succeeded.
    pub fn is_success(&self) -> bool {
        self.tasks.iter().all(|report| report.outcome.is_success())
    }

    fn count(&self, predicate: impl Fn(&TaskOutcome) -> bool) -> usize {
        self.tasks
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Runs a set of wired tasks to completion.
pub struct Scheduler {
    tasks: Vec<Arc<Task>>,
    event_tx: Option<mpsc::UnboundedSender<CrewEvent>>,
}

impl Scheduler {
    /// Create a scheduler over `tasks`, which must be listed in registration
    /// order and already wired.
    pub fn new(tasks: Vec<Arc<Task>>, event_tx: Option<mpsc::UnboundedSender<CrewEvent>>) -> Self {
        Self { tasks, event_tx }
    }

    /// Spawn one unit per unfinished task and join them all.
    ///
    /// A task is run only by the kickoff that claims it. Tasks claimed by
    /// another kickoff, including one that was cancelled while its units kept
    /// running, are awaited instead, so every task runs exactly once and the
    /// report still covers all of them.
    ///
    /// # Errors
    /// Returns [`Error::TaskJoin`] if a unit itself could not be joined.
    /// Agent failures are not errors; they are recorded per task.
    pub async fn run(self) -> Result<CrewOutput> {
        let start = Instant::now();
        let mut claimed = Vec::new();
        let mut in_flight = Vec::new();
        for task in self.tasks.iter().filter(|task| !task.is_finished()) {
            if task.claim() {
                claimed.push(Arc::clone(task));
            } else {
                in_flight.push(Arc::clone(task));
            }
        }

        clog!(
            "Kickoff: running {} of {} tasks, {} already in flight",
            claimed.len(),
            self.tasks.len(),
            in_flight.len()
        );

        let units = claimed.into_iter().map(|task| {
            let events = self.event_tx.clone();
            tokio::spawn(run_unit(task, events))
        });
        let joined = join_all(units).await;

        for task in &in_flight {
            clog_trace!("Kickoff waiting on {} run elsewhere", task.name);
            task.wait().await;
        }

        emit(&self.event_tx, CrewEvent::AllTasksComplete);
        for unit in joined {
            unit.map_err(|e| Error::TaskJoin(e.to_string()))?;
        }

        let output = CrewOutput::collect(&self.tasks, start.elapsed());
        clog!(
            "Kickoff finished in {:?}: {} succeeded, {} failed, {} skipped",
            output.elapsed,
            output.succeeded_count(),
            output.failed_count(),
            output.skipped_count()
        );
        Ok(output)
    }
}

async fn run_unit(task: Arc<Task>, events: Option<mpsc::UnboundedSender<CrewEvent>>) {
    for dependency in task.dependencies() {
        clog_trace!("{} waiting on {}", task.name, dependency.name);
        dependency.wait().await;
    }

    let outcome = match task.dependencies().iter().find(|d| !d.succeeded()) {
        Some(dependency) => TaskOutcome::Skipped {
            dependency: dependency.name.clone(),
        },
        None => execute(&task, &events).await,
    };

    let event = match &outcome {
        TaskOutcome::Succeeded { .. } => CrewEvent::TaskCompleted {
            task: task.name.clone(),
        },
        TaskOutcome::Failed { error } => {
            clog_warn!("Task {} failed: {}", task.name, error);
            CrewEvent::TaskFailed {
                task: task.name.clone(),
                error: error.clone(),
            }
        }
        TaskOutcome::Skipped { dependency } => {
            clog_debug!("Task {} skipped: {} did not succeed", task.name, dependency);
            CrewEvent::TaskSkipped {
                task: task.name.clone(),
                dependency: dependency.clone(),
            }
        }
    };

    if !task.publish(outcome) {
        clog_warn!("Task {} already had an outcome, keeping the first", task.name);
    }
    clog_debug!("Task {} ({}) finished: {}", task.name, task.id.short(), task.status());
    emit(&events, event);
}

async fn execute(task: &Arc<Task>, events: &Option<mpsc::UnboundedSender<CrewEvent>>) -> TaskOutcome {
    let Some(agent) = task.agent().cloned() else {
        return TaskOutcome::Failed {
            error: format!("task {} has no agent", task.name),
        };
    };

    task.mark_started();
    emit(
        events,
        CrewEvent::TaskStarted {
            task: task.name.clone(),
            agent: agent.name().to_string(),
        },
    );
    clog_trace!("Invoking agent {} for {}", agent.name(), task.name);

    let unit = Arc::clone(task);
    let result = util::blocking(move || agent.execute(&unit.description, unit.dependencies())).await;

    match result {
        Ok(Blocking::Finished(Ok(output))) => TaskOutcome::Succeeded { output },
        Ok(Blocking::Finished(Err(e))) => TaskOutcome::Failed {
            error: e.to_string(),
        },
        Ok(Blocking::Panicked(message)) => TaskOutcome::Failed {
            error: format!("agent panicked: {}", message),
        },
        Err(e) => TaskOutcome::Failed {
            error: e.to_string(),
        },
    }
}

fn emit(events: &Option<mpsc::UnboundedSender<CrewEvent>>, event: CrewEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
