//! Integration test suite for crewflow.
//!
//! These tests drive crews through the public API only: registration,
//! kickoff, plan loading and the reporting types.
//!
//! # Test Categories
//!
//! - `crew_e2e`: Registration and kickoff end to end
//! - `parallel_tasks`: Concurrency and dependency ordering with timed agents
//! - `failure_propagation`: Failed and panicking agents, skipped dependents
//! - `plan_loading`: TOML plans, validation and command agents

mod fixtures;

mod parallel_tasks;
mod plan_loading;
