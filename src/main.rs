use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crewflow::config::Config;
use crewflow::{
    clog, clog_error, CommandAgent, Crew, CrewEvent, CrewOutput, CrewPlan, FnAgent, Result, Task,
};

/// Crewflow - run crews of agents over dependent tasks concurrently
#[derive(Parser, Debug)]
#[command(name = "crewflow")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    CREWFLOW_DEBUG=1     Enable debug logging (alternative to --debug)"
)]
pub struct Cli {
    /// Enable debug logging (writes to ~/.crewflow/crewflow.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load a TOML plan and run every task in it
    Run {
        /// Path to the plan file
        plan: PathBuf,

        /// Print the kickoff summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a plan and print its execution order
    Check {
        /// Path to the plan file
        plan: PathBuf,
    },

    /// Run the built-in five-task demo crew
    Demo {
        /// Duration of one work unit in milliseconds
        #[arg(long, default_value_t = 1000)]
        unit_ms: u64,

        /// Print the kickoff summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: failed to load config, using defaults: {}", e);
            Config::default()
        }
    };
    crewflow::log::init_with_debug(cli.debug || config.debug);

    match run_command(cli.command, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            clog_error!("crewflow failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Dispatch a subcommand. Returns false when any task did not succeed.
fn run_command(command: Command, config: &Config) -> Result<bool> {
    match command {
        Command::Run { plan, json } => run_plan(&plan, json, config),
        Command::Check { plan } => check_plan(&plan, config).map(|_| true),
        Command::Demo { unit_ms, json } => run_demo(Duration::from_millis(unit_ms), json),
    }
}

fn run_plan(path: &Path, json: bool, config: &Config) -> Result<bool> {
    clog!("Run command: plan={}, json={}", path.display(), json);

    let plan = CrewPlan::load(path)?;
    let crew = plan.build_crew(config)?;
    let output = kickoff(crew, json)?;
    Ok(output.is_success())
}

fn check_plan(path: &Path, config: &Config) -> Result<()> {
    clog!("Check command: plan={}", path.display());

    let plan = CrewPlan::load(path)?;
    let order = plan.validate()?;

    for spec in &plan.agents {
        let agent = match &spec.command {
            Some(command) => CommandAgent::new(&spec.name, command),
            None => CommandAgent::from_config(&spec.name, config),
        };
        agent.ensure_available()?;
    }

    println!("Plan is valid: {} agents, {} tasks", plan.agents.len(), order.len());
    println!("Execution order:");
    for (position, name) in order.iter().enumerate() {
        println!("  {}. {}", position + 1, name);
    }
    Ok(())
}

/// Build the demo crew: two agents of different speed and five tasks where
/// Task4 waits on Task1 and Task2, and Task5 waits on Task3 and Task4.
fn demo_crew(unit: Duration) -> Result<Crew> {
    let mut crew = Crew::new();
    crew.add_agent(sleeping_agent("Agent1", unit));
    crew.add_agent(sleeping_agent("Agent2", unit * 2));

    let tasks: [(&str, &str, &[&str]); 5] = [
        ("Task1", "Agent1", &[]),
        ("Task2", "Agent2", &[]),
        ("Task3", "Agent2", &[]),
        ("Task4", "Agent1", &["Task1", "Task2"]),
        ("Task5", "Agent1", &["Task3", "Task4"]),
    ];
    for (name, agent, depends_on) in tasks {
        let description = format!("Data for {}", name);
        crew.add_task(Task::new(name, &description), agent, depends_on)?;
    }
    Ok(crew)
}

fn sleeping_agent(name: &str, delay: Duration) -> FnAgent {
    let label = name.to_string();
    FnAgent::new(name, move |input, _| {
        thread::sleep(delay);
        format!("Processed by {}: {}", label, input)
    })
}

fn run_demo(unit: Duration, json: bool) -> Result<bool> {
    clog!("Demo command: unit={:?}, json={}", unit, json);

    let crew = demo_crew(unit)?;
    let output = kickoff(crew, json)?;
    Ok(output.is_success())
}

/// Run a crew on a fresh runtime and print its outcome.
fn kickoff(crew: Crew, json: bool) -> Result<CrewOutput> {
    let rt = tokio::runtime::Runtime::new()?;

    let output = rt.block_on(async {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let crew = crew.with_events(event_tx);
        let printer = tokio::spawn(print_events(event_rx, !json));

        if !json {
            println!("Executing tasks...");
        }
        let output = crew.kickoff().await;

        // Dropping the crew closes the channel so the printer drains and exits.
        drop(crew);
        let _ = printer.await;
        output
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("All tasks completed in {:?}", output.elapsed);
        for report in &output.tasks {
            println!("{} output: {}", report.name, report.outcome);
        }
    }
    Ok(output)
}

async fn print_events(mut event_rx: mpsc::UnboundedReceiver<CrewEvent>, verbose: bool) {
    while let Some(event) = event_rx.recv().await {
        if !verbose {
            continue;
        }
        match event {
            CrewEvent::TaskStarted { task, agent } => eprintln!("  started  {} ({})", task, agent),
            CrewEvent::TaskCompleted { task } => eprintln!("  finished {}", task),
            CrewEvent::TaskFailed { task, error } => eprintln!("  failed   {}: {}", task, error),
            CrewEvent::TaskSkipped { task, dependency } => {
                eprintln!("  skipped  {} ({} did not succeed)", task, dependency)
            }
            CrewEvent::AllTasksComplete => {}
        }
    }
}
