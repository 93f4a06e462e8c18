//! Concurrency and dependency ordering tests.
//!
//! Agents sleep on the blocking pool, so wall-clock time shows whether
//! independent tasks overlap.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crewflow::{Crew, CrewEvent, Task};

use crate::fixtures::{five_task_crew, timed_agent, Timeline};

const UNIT: Duration = Duration::from_millis(100);

/// Given the five-task crew with one-unit and two-unit agents
/// When the crew is kicked off
/// Then it finishes along the critical path in about four units
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_five_tasks_follow_critical_path() {
    let timeline = Timeline::new();
    let crew = five_task_crew(UNIT, &timeline);

    let start = Instant::now();
    let output = crew.kickoff().await.unwrap();
    let elapsed = start.elapsed();

    assert!(output.is_success());
    assert_eq!(timeline.len(), 5);
    assert!(elapsed >= UNIT * 4, "finished too early: {:?}", elapsed);
    assert!(
        elapsed < UNIT * 6,
        "expected about 4 units, sequential would be 7: {:?}",
        elapsed
    );
    assert_eq!(
        output.output("Task5"),
        Some("Processed by Agent1: Task5")
    );
}

/// Every dependent starts only after all of its dependencies ended.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dependents_start_after_dependencies() {
    let timeline = Timeline::new();
    let crew = five_task_crew(UNIT / 2, &timeline);
    crew.kickoff().await.unwrap();

    let task4 = timeline.span("Task4");
    let task5 = timeline.span("Task5");
    assert!(task4.start >= timeline.span("Task1").end);
    assert!(task4.start >= timeline.span("Task2").end);
    assert!(task5.start >= timeline.span("Task3").end);
    assert!(task5.start >= task4.end);

    // Independent roots overlap.
    let task2 = timeline.span("Task2");
    let task3 = timeline.span("Task3");
    assert!(task3.start < task2.end && task2.start < task3.end);
}

/// A dependency's outcome is published before the dependent's agent runs.
#[tokio::test]
async fn test_dependent_sees_published_output() {
    let mut crew = Crew::new();
    crew.add_agent(crewflow::FnAgent::new("reader", |input, deps| {
        match deps.first() {
            Some(dep) => format!("{} saw {}", input, dep.output().unwrap_or("nothing")),
            None => input.to_string(),
        }
    }));

    crew.add_task(Task::new("A", "a"), "reader", &[]).unwrap();
    let b = crew.add_task(Task::new("B", "b"), "reader", &["A"]).unwrap();
    crew.kickoff().await.unwrap();

    assert_eq!(b.output(), Some("b saw a"));
}

/// A wide fan-out runs its leaves concurrently.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_runs_concurrently() {
    let timeline = Timeline::new();
    let mut crew = Crew::new();
    crew.add_agent(timed_agent("worker", UNIT, &timeline));

    crew.add_task(Task::new("root", "root"), "worker", &[]).unwrap();
    for i in 0..8 {
        let name = format!("leaf{}", i);
        crew.add_task(Task::new(&name, &name), "worker", &["root"])
            .unwrap();
    }

    let output = crew.kickoff().await.unwrap();

    assert_eq!(output.succeeded_count(), 9);
    assert!(
        output.elapsed < UNIT * 5,
        "leaves did not overlap: {:?}",
        output.elapsed
    );
}

/// Started and completed events arrive for every task, then the final event.
#[tokio::test]
async fn test_events_cover_every_task() {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let timeline = Timeline::new();
    let crew = five_task_crew(Duration::from_millis(5), &timeline).with_events(event_tx);

    crew.kickoff().await.unwrap();
    drop(crew);

    let mut started = 0;
    let mut completed = 0;
    let mut last = None;
    while let Some(event) = event_rx.recv().await {
        match &event {
            CrewEvent::TaskStarted { .. } => started += 1,
            CrewEvent::TaskCompleted { .. } => completed += 1,
            _ => {}
        }
        last = Some(event);
    }

    assert_eq!(started, 5);
    assert_eq!(completed, 5);
    assert_eq!(last, Some(CrewEvent::AllTasksComplete));
}
