//! Simulate command - train an agent against the scripted world

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    app::{AgentConfig, App},
    cli::output::{format_number, format_percent, print_kv, print_section, print_subsection},
    decision::LoopStats,
    observers::{JsonlObserver, ProgressObserver},
    ports::Observer,
    simulation::{self, ScriptedWorld, WorldConfig},
    types::{ActionSet, Outcome},
};

#[derive(Parser, Debug)]
#[command(about = "Train an agent in the scripted world", allow_negative_numbers = true)]
pub struct SimulateArgs {
    /// Agent configuration file (JSON); flags below override it
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// World dynamics file (JSON)
    #[arg(long)]
    pub world: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(long, short = 't', default_value_t = 1000)]
    pub ticks: u64,

    /// Action set (basic or extended)
    #[arg(long, short = 'a')]
    pub actions: Option<ActionSet>,

    /// Learning rate α
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor γ
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Softmax temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// File the Q-table is loaded from and saved to
    #[arg(long, short = 'p')]
    pub persist: Option<PathBuf>,

    /// Ignore any stored table and start from zeros
    #[arg(long, default_value_t = false)]
    pub fresh: bool,

    /// Save the table every N ticks
    #[arg(long)]
    pub snapshot_every: Option<u64>,

    /// Random seed for action selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Random seed for the world (defaults to seed+1)
    #[arg(long)]
    pub world_seed: Option<u64>,

    /// Optional file for JSONL tick reports
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

#[derive(Debug, Serialize)]
struct ActionSummary {
    action: String,
    chosen: u64,
    succeeded: u64,
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    ticks: u64,
    updates: u64,
    total_reward: f64,
    mean_reward: f64,
    targets_cleared: u64,
    actions: Vec<ActionSummary>,
    outcomes: Vec<(String, u64)>,
    snapshots_saved: u64,
    snapshots_failed: u64,
    config: AgentConfig,
    world: WorldConfig,
}

impl SimulationSummary {
    fn new(stats: &LoopStats, config: AgentConfig, world: &ScriptedWorld) -> Self {
        let actions = config
            .actions
            .actions()
            .iter()
            .map(|action| ActionSummary {
                action: action.label().to_string(),
                chosen: stats.action_counts.get(action.index()).copied().unwrap_or(0),
                succeeded: stats
                    .action_successes
                    .get(action.index())
                    .copied()
                    .unwrap_or(0),
            })
            .collect();
        let outcomes = Outcome::ALL
            .iter()
            .map(|outcome| {
                (
                    outcome.label().to_string(),
                    stats.outcome_counts[outcome.index()],
                )
            })
            .collect();
        Self {
            ticks: stats.ticks,
            updates: stats.updates,
            total_reward: stats.total_reward,
            mean_reward: stats.mean_reward(),
            targets_cleared: world.targets_cleared(),
            actions,
            outcomes,
            snapshots_saved: stats.snapshots_saved,
            snapshots_failed: stats.snapshots_failed,
            config,
            world: *world.config(),
        }
    }
}

fn agent_config(args: &SimulateArgs) -> Result<AgentConfig> {
    let mut config = match &args.config {
        Some(path) => AgentConfig::from_json_file(path)
            .with_context(|| format!("Failed to load agent config {}", path.display()))?,
        None => AgentConfig::default(),
    };

    if let Some(actions) = args.actions {
        if actions != config.actions {
            // Presets and declared shapes belong to the configured set.
            config.rewards = None;
            config.state_count = None;
            config.action_count = None;
            config.features = None;
        }
        config.actions = actions;
    }
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(gamma) = args.gamma {
        config.gamma = gamma;
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(path) = &args.persist {
        config.persist_path = Some(path.clone());
    }
    if args.fresh {
        config.load_existing = false;
    }
    if let Some(every) = args.snapshot_every {
        config.snapshot_every = Some(every);
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    config.validate().context("Invalid agent configuration")?;
    Ok(config)
}

fn world_config(args: &SimulateArgs) -> Result<WorldConfig> {
    let Some(path) = &args.world else {
        return Ok(WorldConfig::default());
    };
    let file = File::open(path)
        .with_context(|| format!("Failed to open world config {}", path.display()))?;
    let config: WorldConfig = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse world config {}", path.display()))?;
    Ok(config)
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    let config = agent_config(&args)?;
    let world_config = world_config(&args)?;
    let world_seed = args.world_seed.or(config.seed.map(|s| s.wrapping_add(1)));

    let app = App::new();
    let mut agent = app
        .create_agent(config.clone())
        .context("Failed to create agent")?;
    let mut world =
        ScriptedWorld::new(world_config, world_seed).context("Invalid world configuration")?;

    let mut observers: Vec<Box<dyn Observer>> = Vec::new();
    if !args.no_progress {
        observers.push(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to create observation file {}", path.display()))?;
        observers.push(Box::new(observer));
    }

    let stats = simulation::run(&mut agent, &mut world, args.ticks, &mut observers)
        .context("Simulation failed")?;

    print_section("Simulation Complete");
    print_kv("Actions", &config.actions.to_string());
    print_kv("Ticks", &format_number(stats.ticks));
    print_kv("Updates", &format_number(stats.updates));
    print_kv("Total reward", &format!("{:.2}", stats.total_reward));
    print_kv("Mean reward", &format!("{:.4}", stats.mean_reward()));
    print_kv("Targets cleared", &format_number(world.targets_cleared()));

    print_subsection("Actions");
    for action in config.actions.actions() {
        let chosen = stats.action_counts[action.index()];
        let succeeded = stats.action_successes[action.index()];
        let share = if stats.ticks == 0 {
            0.0
        } else {
            chosen as f64 / stats.ticks as f64
        };
        print_kv(
            action.label(),
            &format!(
                "{} chosen ({}), {} succeeded",
                format_number(chosen),
                format_percent(share),
                format_number(succeeded)
            ),
        );
    }

    if let Some(path) = &config.persist_path {
        agent.save().context("Failed to save Q-table")?;
        println!("\n✓ Q-table saved to: {}", path.display());
    }

    if let Some(path) = &args.summary {
        let summary = SimulationSummary::new(&stats, config.clone(), &world);
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &summary).context("Failed to write summary")?;
        println!("✓ Summary written to: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> SimulateArgs {
        let mut argv = vec!["simulate"];
        argv.extend_from_slice(extra);
        SimulateArgs::parse_from(argv)
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = agent_config(&args(&[
            "--actions",
            "extended",
            "--gamma",
            "0",
            "--seed",
            "9",
            "--fresh",
        ]))
        .unwrap();
        assert_eq!(config.actions, ActionSet::Extended);
        assert_eq!(config.gamma, 0.0);
        assert_eq!(config.seed, Some(9));
        assert!(!config.load_existing);
        assert_eq!(config.shape().unwrap(), (8, 6));
    }

    #[test]
    fn test_invalid_flag_values_rejected() {
        assert!(agent_config(&args(&["--alpha", "1.5"])).is_err());
        assert!(agent_config(&args(&["--snapshot-every", "5"])).is_err());
    }

    #[test]
    fn test_execute_writes_table_and_summary() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let table = temp_dir.path().join("agent.qtable");
        let summary = temp_dir.path().join("summary.json");
        let observations = temp_dir.path().join("ticks.jsonl");

        execute(args(&[
            "--ticks",
            "50",
            "--seed",
            "1",
            "--no-progress",
            "--persist",
            table.to_str().unwrap(),
            "--summary",
            summary.to_str().unwrap(),
            "--observations",
            observations.to_str().unwrap(),
        ]))
        .unwrap();

        assert!(table.exists());
        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
        assert_eq!(summary["ticks"], 50);
        assert_eq!(summary["updates"], 49);
        let lines = std::fs::read_to_string(&observations).unwrap();
        assert_eq!(lines.lines().count(), 50);
    }
}
