//! Declarative crew plans.
//!
//! A plan lists agents and tasks in TOML. Tasks may appear in any order;
//! the plan is validated through a [`TaskGraph`] and registered in
//! topological order, so forward references work and cycles are rejected
//! before anything runs.
//!
//! ```toml
//! [[agents]]
//! name = "writer"
//! command = "echo Drafted:"
//!
//! [[tasks]]
//! name = "review"
//! description = "Review the draft"
//! agent = "writer"
//! depends_on = ["draft"]
//!
//! [[tasks]]
//! name = "draft"
//! description = "Write the draft"
//! agent = "writer"
//! ```

use crate::agent::CommandAgent;
use crate::config::Config;
use crate::core::dag::TaskGraph;
use crate::core::task::Task;
use crate::crew::Crew;
use crate::error::{Error, Result};
use crate::clog_debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// An agent declared in a plan, run as an external command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    /// Command line; the configured default command when absent.
    pub command: Option<String>,
}

/// A task declared in a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub agent: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CrewPlan {
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl CrewPlan {
    pub fn parse(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        clog_debug!("CrewPlan::load path={}", path.display());
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn declares_agent(&self, name: &str) -> bool {
        self.agents.iter().any(|agent| agent.name == name)
    }

    /// Validate the plan on its own and return task names in execution order.
    pub fn validate(&self) -> Result<Vec<&str>> {
        let order = self.ordered(|_| false, |agent| self.declares_agent(agent))?;
        Ok(order.into_iter().map(|spec| spec.name.as_str()).collect())
    }

    /// Order plan tasks so each follows its dependencies.
    ///
    /// `existing_task` and `known_agent` describe what the target crew
    /// already holds; dependencies on existing tasks add no edges.
    fn ordered(
        &self,
        existing_task: impl Fn(&str) -> bool,
        known_agent: impl Fn(&str) -> bool,
    ) -> Result<Vec<&TaskSpec>> {
        let mut graph = TaskGraph::new();
        let mut seen = HashSet::new();
        for spec in &self.tasks {
            if !seen.insert(spec.name.as_str()) || existing_task(&spec.name) {
                return Err(Error::DuplicateTask(spec.name.clone()));
            }
            graph.add_task(&spec.name);
        }

        for spec in &self.tasks {
            if !known_agent(&spec.agent) {
                return Err(Error::UnknownAgent(spec.agent.clone()));
            }
            for dependency in &spec.depends_on {
                if graph.contains(dependency) {
                    graph.add_dependency(dependency, &spec.name)?;
                } else if !existing_task(dependency) {
                    return Err(Error::UnknownDependency(dependency.clone()));
                }
            }
        }

        let order = graph.topological_order()?;
        Ok(order
            .into_iter()
            .filter_map(|name| self.tasks.iter().find(|spec| spec.name == name))
            .collect())
    }

    /// Register the plan's tasks into `crew`.
    ///
    /// Task agents and external dependencies must already be registered in
    /// the crew. The whole plan is validated first, so on error the crew is
    /// left unchanged.
    pub fn register_into(&self, crew: &mut Crew) -> Result<Vec<Arc<Task>>> {
        let order = self.ordered(
            |name| crew.task(name).is_some(),
            |name| crew.agent(name).is_some(),
        )?;

        let mut registered = Vec::with_capacity(order.len());
        for spec in order {
            let depends_on: Vec<&str> = spec.depends_on.iter().map(String::as_str).collect();
            let task = Task::new(&spec.name, &spec.description);
            registered.push(crew.add_task(task, &spec.agent, &depends_on)?);
        }
        Ok(registered)
    }

    /// Build a crew with a [`CommandAgent`] per declared agent and all plan
    /// tasks registered.
    pub fn build_crew(&self, config: &Config) -> Result<Crew> {
        let mut crew = Crew::new();
        for spec in &self.agents {
            let agent = match &spec.command {
                Some(command) => CommandAgent::new(&spec.name, command),
                None => CommandAgent::from_config(&spec.name, config),
            };
            crew.add_agent(agent);
        }
        self.register_into(&mut crew)?;
        Ok(crew)
    }
}
