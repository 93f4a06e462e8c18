//! Agents: named executors that turn a task description into an output.
//!
//! The engine only sees the [`Agent`] capability. [`FnAgent`] wraps an
//! in-process closure; [`CommandAgent`] runs an external command.

use crate::config::Config;
use crate::core::task::Task;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::process::Command;
use std::sync::Arc;

/// Environment variable carrying completed dependency outputs as a JSON
/// object (task name to output) for [`CommandAgent`] processes.
pub const DEPENDENCIES_ENV: &str = "CREWFLOW_DEPENDENCIES";

/// Error returned by an agent's work.
pub type AgentError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single agent execution.
pub type AgentResult = std::result::Result<String, AgentError>;

/// A named executor.
///
/// `execute` receives the task description and the task's dependencies,
/// all of which have finished by the time it is called. It may block;
/// the engine runs it on the blocking thread pool.
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn execute(&self, description: &str, dependencies: &[Arc<Task>]) -> AgentResult;
}

type AgentFn = dyn Fn(&str, &[Arc<Task>]) -> AgentResult + Send + Sync;

/// Agent backed by an in-process closure.
pub struct FnAgent {
    name: String,
    function: Box<AgentFn>,
}

impl FnAgent {
    /// Wrap an infallible work function.
    pub fn new<F>(name: &str, function: F) -> Self
    where
        F: Fn(&str, &[Arc<Task>]) -> String + Send + Sync + 'static,
    {
        Self::fallible(name, move |description: &str, dependencies: &[Arc<Task>]| {
            Ok(function(description, dependencies))
        })
    }

    /// Wrap a work function that can report failure.
    pub fn fallible<F>(name: &str, function: F) -> Self
    where
        F: Fn(&str, &[Arc<Task>]) -> AgentResult + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            function: Box::new(function),
        }
    }
}

impl Agent for FnAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, description: &str, dependencies: &[Arc<Task>]) -> AgentResult {
        (self.function)(description, dependencies)
    }
}

impl std::fmt::Debug for FnAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAgent").field("name", &self.name).finish()
    }
}

/// Agent that runs an external command.
///
/// The task description is appended as the last argument and trimmed
/// stdout becomes the output. A non-zero exit fails the task.
#[derive(Debug, Clone)]
pub struct CommandAgent {
    name: String,
    base_command: Vec<String>,
}

impl CommandAgent {
    pub fn new(name: &str, command_line: &str) -> Self {
        Self {
            name: name.to_string(),
            base_command: command_line.split_whitespace().map(String::from).collect(),
        }
    }

    /// Build an agent running the configured default command.
    pub fn from_config(name: &str, config: &Config) -> Self {
        Self::new(name, config.effective_command())
    }

    pub fn binary(&self) -> Option<&str> {
        self.base_command.first().map(|s| s.as_str())
    }

    pub fn command(&self, description: &str) -> Vec<String> {
        let mut cmd = self.base_command.clone();
        cmd.push(description.to_string());
        cmd
    }

    pub fn is_available(&self) -> bool {
        self.binary()
            .map(|binary| which::which(binary).is_ok())
            .unwrap_or(false)
    }

    /// Fail with [`Error::AgentNotAvailable`] when the binary is not on PATH.
    pub fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::AgentNotAvailable(format!(
                "{} ({})",
                self.name,
                self.binary().unwrap_or("empty command")
            )))
        }
    }
}

/// Collect the outputs of finished dependencies keyed by task name.
pub fn dependency_outputs(dependencies: &[Arc<Task>]) -> BTreeMap<&str, &str> {
    dependencies
        .iter()
        .filter_map(|task| task.output().map(|output| (task.name.as_str(), output)))
        .collect()
}

impl Agent for CommandAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, description: &str, dependencies: &[Arc<Task>]) -> AgentResult {
        let (program, args) = self
            .base_command
            .split_first()
            .ok_or_else(|| format!("agent {} has an empty command", self.name))?;

        let payload = serde_json::to_string(&dependency_outputs(dependencies))?;
        let output = Command::new(program)
            .args(args)
            .arg(description)
            .env(DEPENDENCIES_ENV, payload)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} exited with {}: {}", program, output.status, stderr.trim()).into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
