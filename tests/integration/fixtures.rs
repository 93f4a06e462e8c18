//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Agents that sleep for a fixed time and record when they ran
//! - The five-task crew used by the concurrency tests
//! - Writing plan files into temporary directories

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use crewflow::{Crew, FnAgent, Task};

/// Start and end instants of one agent invocation.
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub start: Instant,
    pub end: Instant,
}

/// Records when each task's agent ran, keyed by task description.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    spans: Arc<Mutex<HashMap<String, Span>>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: &str, span: Span) {
        self.spans.lock().unwrap().insert(key.to_string(), span);
    }

    pub fn span(&self, key: &str) -> Span {
        *self
            .spans
            .lock()
            .unwrap()
            .get(key)
            .unwrap_or_else(|| panic!("no span recorded for {}", key))
    }

    pub fn len(&self) -> usize {
        self.spans.lock().unwrap().len()
    }
}

/// An agent that sleeps for `delay`, records its span, and echoes its input.
pub fn timed_agent(name: &str, delay: Duration, timeline: &Timeline) -> FnAgent {
    let label = name.to_string();
    let timeline = timeline.clone();
    FnAgent::new(name, move |input, _| {
        let start = Instant::now();
        thread::sleep(delay);
        timeline.record(
            input,
            Span {
                start,
                end: Instant::now(),
            },
        );
        format!("Processed by {}: {}", label, input)
    })
}

/// An agent returning `"Completed: " + input`.
pub fn completing_agent(name: &str) -> FnAgent {
    FnAgent::new(name, |input, _| format!("Completed: {}", input))
}

/// Five tasks over two agents, Agent1 taking one unit and Agent2 two:
/// Task4 depends on Task1 and Task2, Task5 on Task3 and Task4.
///
/// Descriptions are the task names so spans can be looked up by name.
pub fn five_task_crew(unit: Duration, timeline: &Timeline) -> Crew {
    let mut crew = Crew::new();
    crew.add_agent(timed_agent("Agent1", unit, timeline));
    crew.add_agent(timed_agent("Agent2", unit * 2, timeline));

    crew.add_task(Task::new("Task1", "Task1"), "Agent1", &[])
        .unwrap();
    crew.add_task(Task::new("Task2", "Task2"), "Agent2", &[])
        .unwrap();
    crew.add_task(Task::new("Task3", "Task3"), "Agent2", &[])
        .unwrap();
    crew.add_task(Task::new("Task4", "Task4"), "Agent1", &["Task1", "Task2"])
        .unwrap();
    crew.add_task(Task::new("Task5", "Task5"), "Agent1", &["Task3", "Task4"])
        .unwrap();
    crew
}

/// A temporary directory holding a single plan file.
pub struct PlanFile {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl PlanFile {
    pub fn new(contents: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("crew.toml");
        std::fs::write(&path, contents).expect("Failed to write plan");
        Self { temp_dir, path }
    }
}
