//! Inspect command - print a stored Q-table with state and action labels

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;

use crate::{
    app::{AgentConfig, App},
    cli::output::{format_percent, print_kv, print_section, print_subsection},
    encoder::StateEncoder,
    q_learning::{QTable, policy::probabilities},
    types::ActionSet,
};

#[derive(Parser, Debug)]
#[command(about = "Print a stored Q-table")]
pub struct InspectArgs {
    /// Table file to read
    pub path: PathBuf,

    /// Agent configuration the table was trained with (fixes features and actions)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Action set, when no configuration file is given
    #[arg(long, short = 'a', default_value = "basic")]
    pub actions: ActionSet,

    /// Temperature used to show selection probabilities (defaults to the config's)
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Emit JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StateRow {
    state: usize,
    description: String,
    values: Vec<(String, f64)>,
    probabilities: Vec<f64>,
    greedy: String,
}

#[derive(Debug, Serialize)]
struct TableDump {
    states: usize,
    actions: usize,
    temperature: f64,
    rows: Vec<StateRow>,
}

fn dump(
    table: &QTable,
    encoder: &StateEncoder,
    actions: ActionSet,
    temperature: f64,
) -> Result<TableDump> {
    let mut rows = Vec::with_capacity(table.state_count());
    for (state, row) in table.rows().enumerate() {
        let greedy = table.greedy_action(state)?;
        rows.push(StateRow {
            state,
            description: encoder.describe(state)?,
            values: actions
                .actions()
                .iter()
                .zip(row)
                .map(|(action, value)| (action.label().to_string(), *value))
                .collect(),
            probabilities: probabilities(row, temperature),
            greedy: actions
                .get(greedy)
                .map(|action| action.label().to_string())
                .unwrap_or_default(),
        });
    }
    Ok(TableDump {
        states: table.state_count(),
        actions: table.action_count(),
        temperature,
        rows,
    })
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => AgentConfig::from_json_file(path)
            .with_context(|| format!("Failed to load agent config {}", path.display()))?,
        None => AgentConfig::new(args.actions),
    };
    let shape = config.shape()?;
    let encoder = StateEncoder::new(config.resolved_features())?;
    let temperature = args.temperature.unwrap_or(config.temperature);

    let app = App::new();
    if app.read_saved(&args.path)?.is_none() {
        bail!("No Q-table stored at {}", args.path.display());
    }
    let table = app
        .load_table(&args.path, shape)
        .with_context(|| format!("Failed to load Q-table {}", args.path.display()))?;
    let dump = dump(&table, &encoder, config.actions, temperature)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    print_section(&format!("Q-table {}", args.path.display()));
    print_kv("States", &dump.states.to_string());
    print_kv("Actions", &format!("{} ({})", dump.actions, config.actions));
    print_kv("Temperature", &temperature.to_string());

    for row in &dump.rows {
        print_subsection(&format!("State {}: {}", row.state, row.description));
        for ((label, value), p) in row.values.iter().zip(&row.probabilities) {
            let marker = if *label == row.greedy { "*" } else { " " };
            print_kv(
                &format!("{marker} {label}"),
                &format!("{value:>10.4}  {}", format_percent(*p)),
            );
        }
    }
    Ok(())
}
