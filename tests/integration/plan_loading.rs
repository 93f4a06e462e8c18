//! TOML plan tests: loading, validation and command agents.

use crewflow::config::Config;
use crewflow::{Crew, CrewPlan, Error, FnAgent};

use crate::fixtures::PlanFile;

const REVIEW_PLAN: &str = r#"
[[agents]]
name = "writer"
command = "echo Drafted:"

[[agents]]
name = "fallback"

[[tasks]]
name = "publish"
description = "Publish the article"
agent = "writer"
depends_on = ["review", "illustrate"]

[[tasks]]
name = "review"
description = "Review the draft"
agent = "writer"
depends_on = ["draft"]

[[tasks]]
name = "illustrate"
description = "Draw a figure"
agent = "fallback"

[[tasks]]
name = "draft"
description = "Write the draft"
agent = "writer"
"#;

fn position(order: &[&str], name: &str) -> usize {
    order.iter().position(|n| *n == name).unwrap()
}

#[test]
fn test_plan_registers_in_dependency_order() {
    let file = PlanFile::new(REVIEW_PLAN);
    let plan = CrewPlan::load(&file.path).unwrap();

    let order = plan.validate().unwrap();
    assert_eq!(order.len(), 4);
    assert!(position(&order, "draft") < position(&order, "review"));
    assert!(position(&order, "review") < position(&order, "publish"));
    assert!(position(&order, "illustrate") < position(&order, "publish"));

    let crew = plan.build_crew(&Config::default()).unwrap();
    assert_eq!(crew.agent_count(), 2);
    let publish = crew.task("publish").unwrap();
    let deps: Vec<&str> = publish.dependencies().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(deps, vec!["review", "illustrate"]);
}

#[test]
fn test_plan_cycle_rejected_before_registration() {
    let file = PlanFile::new(
        r#"
[[agents]]
name = "a"

[[tasks]]
name = "one"
agent = "a"
depends_on = ["three"]

[[tasks]]
name = "two"
agent = "a"
depends_on = ["one"]

[[tasks]]
name = "three"
agent = "a"
depends_on = ["two"]
"#,
    );
    let plan = CrewPlan::load(&file.path).unwrap();

    assert!(matches!(plan.validate(), Err(Error::CyclicDependency(_))));
    assert!(matches!(
        plan.build_crew(&Config::default()),
        Err(Error::CyclicDependency(_))
    ));
}

#[test]
fn test_malformed_plan_is_a_parse_error() {
    let file = PlanFile::new("[[tasks]]\nname = 42\n");
    assert!(matches!(
        CrewPlan::load(&file.path),
        Err(Error::TomlParse(_))
    ));
}

/// Plan tasks can use in-process agents and depend on tasks already in the crew.
#[tokio::test]
async fn test_plan_extends_existing_crew() {
    let mut crew = Crew::new();
    crew.add_agent(FnAgent::new("local", |input, deps| {
        let upstream: Vec<&str> = deps.iter().filter_map(|d| d.output()).collect();
        if upstream.is_empty() {
            input.to_string()
        } else {
            format!("{} <- {}", input, upstream.join(","))
        }
    }));
    crew.add_task(crewflow::Task::new("seed", "seed"), "local", &[])
        .unwrap();

    let plan = CrewPlan::parse(
        r#"
[[tasks]]
name = "grow"
description = "grow"
agent = "local"
depends_on = ["seed"]
"#,
    )
    .unwrap();
    plan.register_into(&mut crew).unwrap();

    let output = crew.kickoff().await.unwrap();
    assert_eq!(output.output("grow"), Some("grow <- seed"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_agents_run_plan() {
    let file = PlanFile::new(REVIEW_PLAN);
    let plan = CrewPlan::load(&file.path).unwrap();
    let config = Config {
        command: Some("echo Sketched:".to_string()),
        ..Default::default()
    };
    let crew = plan.build_crew(&config).unwrap();

    let output = crew.kickoff().await.unwrap();

    assert!(output.is_success());
    assert_eq!(output.output("draft"), Some("Drafted: Write the draft"));
    assert_eq!(output.output("illustrate"), Some("Sketched: Draw a figure"));
    assert_eq!(output.output("publish"), Some("Drafted: Publish the article"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_command_skips_dependents() {
    let plan = CrewPlan::parse(
        r#"
[[agents]]
name = "broken"
command = "false"

[[agents]]
name = "echo"
command = "echo"

[[tasks]]
name = "first"
agent = "broken"

[[tasks]]
name = "second"
agent = "echo"
depends_on = ["first"]
"#,
    )
    .unwrap();
    let crew = plan.build_crew(&Config::default()).unwrap();

    let output = crew.kickoff().await.unwrap();

    assert_eq!(output.failed_count(), 1);
    assert_eq!(output.skipped_count(), 1);
    assert!(!output.is_success());
}
