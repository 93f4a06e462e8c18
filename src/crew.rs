//! The crew: a registry of agents and tasks, and the entry point for kickoff.
//!
//! Registration is single-threaded and happens before kickoff. Dependencies
//! must already be registered when a task is added, so cycles cannot be
//! built through [`Crew::add_task`].

use crate::agent::Agent;
use crate::core::dag::TaskGraph;
use crate::core::task::Task;
use crate::error::{Error, Result};
use crate::orchestration::{CrewEvent, CrewOutput, Scheduler};
use crate::{clog_debug, clog_warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Registry of agents and tasks.
///
/// # Example
///
/// ```ignore
/// use crewflow::{Crew, FnAgent, Task};
///
/// let mut crew = Crew::new();
/// crew.add_agent(FnAgent::new("Agent1", |input, _| format!("Completed: {}", input)));
/// let first = crew.add_task(Task::new("Task1", "First Task"), "Agent1", &[])?;
/// crew.add_task(Task::new("Task2", "Second Task"), "Agent1", &["Task1"])?;
///
/// crew.kickoff().await?;
/// assert_eq!(first.output(), Some("Completed: First Task"));
/// ```
pub struct Crew {
    agents: HashMap<String, Arc<dyn Agent>>,
    tasks: HashMap<String, Arc<Task>>,
    /// Task names in registration order.
    order: Vec<String>,
    event_tx: Option<mpsc::UnboundedSender<CrewEvent>>,
}

impl Crew {
    /// Create an empty crew.
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
            tasks: HashMap::new(),
            order: Vec::new(),
            event_tx: None,
        }
    }

    /// Emit lifecycle events on `event_tx` during kickoff.
    ///
    /// The channel is unbounded so a slow consumer never stalls execution.
    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<CrewEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Register an agent under its name.
    ///
    /// An agent already registered under the same name is replaced. Tasks
    /// wired before the replacement keep the agent they were wired to.
    pub fn add_agent<A: Agent + 'static>(&mut self, agent: A) {
        self.add_shared_agent(Arc::new(agent));
    }

    /// Register an already shared agent.
    pub fn add_shared_agent(&mut self, agent: Arc<dyn Agent>) {
        let name = agent.name().to_string();
        clog_debug!("Crew::add_agent name={}", name);
        if self.agents.insert(name.clone(), agent).is_some() {
            clog_warn!("Agent {} was already registered and has been replaced", name);
        }
    }

    pub fn agent(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.get(name)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Register a task, wiring it to an agent and to already registered
    /// dependencies.
    ///
    /// All lookups happen before anything is wired, so a failed call leaves
    /// the crew unchanged.
    ///
    /// # Errors
    /// - [`Error::UnknownAgent`] if `agent_name` is not registered
    /// - [`Error::UnknownDependency`] for the first name in `depends_on`
    ///   that is not registered
    /// - [`Error::DuplicateTask`] if a task with the same name exists
    pub fn add_task(
        &mut self,
        task: Task,
        agent_name: &str,
        depends_on: &[&str],
    ) -> Result<Arc<Task>> {
        let agent = self
            .agents
            .get(agent_name)
            .cloned()
            .ok_or_else(|| Error::UnknownAgent(agent_name.to_string()))?;

        let dependencies = depends_on
            .iter()
            .map(|name| {
                self.tasks
                    .get(*name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownDependency(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        if self.tasks.contains_key(&task.name) {
            return Err(Error::DuplicateTask(task.name));
        }

        clog_debug!(
            "Crew::add_task name={} id={} agent={} depends_on={:?}",
            task.name,
            task.id.short(),
            agent_name,
            depends_on
        );

        let task = Arc::new(task.wire(agent, dependencies));
        self.order.push(task.name.clone());
        self.tasks.insert(task.name.clone(), Arc::clone(&task));
        Ok(task)
    }

    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    /// Registered tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Dependency graph of the registered tasks.
    pub fn graph(&self) -> Result<TaskGraph> {
        let mut graph = TaskGraph::new();
        for task in self.tasks() {
            graph.add_task(&task.name);
        }
        for task in self.tasks() {
            for dependency in task.dependencies() {
                graph.add_dependency(&dependency.name, &task.name)?;
            }
        }
        Ok(graph)
    }

    /// Run every registered task that has not finished yet.
    ///
    /// Each task runs in its own unit as soon as its dependencies have
    /// finished. Returns once every unit has published its outcome. Tasks
    /// finished by an earlier kickoff are not run again.
    pub async fn kickoff(&self) -> Result<CrewOutput> {
        let tasks: Vec<Arc<Task>> = self.tasks().cloned().collect();
        Scheduler::new(tasks, self.event_tx.clone()).run().await
    }
}

impl Default for Crew {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crew")
            .field("agents", &self.agent_count())
            .field("tasks", &self.order)
            .finish()
    }
}
