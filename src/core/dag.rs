//! Task dependency graph.
//!
//! `TaskGraph` holds task names as nodes and "must finish before" edges.
//! Unlike the crew registry, it accepts tasks and edges in any order, so it
//! is the place where cycles are detected before anything runs.

use crate::error::{Error, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Directed graph of task dependencies keyed by task name.
pub struct TaskGraph {
    graph: DiGraph<String, ()>,
    task_index: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
        }
    }

    /// Add a task node. Adding an existing name returns its existing index.
    pub fn add_task(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.task_index.get(name) {
            return index;
        }
        let index = self.graph.add_node(name.to_string());
        self.task_index.insert(name.to_string(), index);
        index
    }

    /// Record that `from` must finish before `to` starts.
    ///
    /// # Errors
    /// Returns [`Error::UnknownDependency`] if `from` is not in the graph and
    /// [`Error::Validation`] if `to` is not.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<()> {
        let from_index = *self
            .task_index
            .get(from)
            .ok_or_else(|| Error::UnknownDependency(from.to_string()))?;
        let to_index = *self
            .task_index
            .get(to)
            .ok_or_else(|| Error::Validation(format!("Task {} not found in graph", to)))?;

        self.graph.add_edge(from_index, to_index, ());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.task_index.contains_key(name)
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Names of the tasks `name` depends on.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, petgraph::Direction::Incoming)
    }

    /// Names of the tasks that depend on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: petgraph::Direction) -> Vec<&str> {
        match self.task_index.get(name) {
            Some(&index) => self
                .graph
                .neighbors_directed(index, direction)
                .filter_map(|n| self.graph.node_weight(n).map(String::as_str))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Task names ordered so that every task comes after its dependencies.
    ///
    /// # Errors
    /// Returns [`Error::CyclicDependency`] naming a task on a cycle.
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let task_name = self
                .graph
                .node_weight(cycle.node_id())
                .map(String::as_str)
                .unwrap_or("unknown");
            Error::CyclicDependency(task_name.to_string())
        })?;

        Ok(sorted
            .into_iter()
            .filter_map(|index| self.graph.node_weight(index).map(String::as_str))
            .collect())
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
