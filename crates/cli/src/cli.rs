//! CLI wiring for placeforge.

use crate::session::{load_graph, write_graph, PlacementSession, SessionOptions};
use anyhow::Result;
use clap::{Parser, Subcommand};
use placeforge_costs::CostEstimator;
use placeforge_ir::{GraphBuilder, GraphDef};
use placeforge_optimizer::stats::{CostStats, GraphStats};
use placeforge_optimizer::PlacementStrategy;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "placeforge", about = "Cost-aware device placement for computation graphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    LocalSearch,
    DefaultDevice,
}

impl From<StrategyArg> for PlacementStrategy {
    fn from(value: StrategyArg) -> PlacementStrategy {
        match value {
            StrategyArg::LocalSearch => PlacementStrategy::LocalSearch,
            StrategyArg::DefaultDevice => PlacementStrategy::DefaultDevice,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Place a graph and write the result.
    Optimize {
        #[arg(long)]
        graph: PathBuf,
        #[arg(long)]
        cluster: Option<PathBuf>,
        /// Comma-separated device list, used when no cluster file is given.
        #[arg(long, value_delimiter = ',')]
        devices: Vec<String>,
        #[arg(long)]
        costs: Option<PathBuf>,
        #[arg(long)]
        knobs: Option<PathBuf>,
        #[arg(long)]
        compute_margin: Option<f64>,
        #[arg(long)]
        min_execution_time: Option<i64>,
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print node, device and cost statistics of a graph.
    Stats {
        #[arg(long)]
        graph: PathBuf,
        #[arg(long)]
        costs: Option<PathBuf>,
    },
    /// Print a sample graph as JSON.
    EmitSample,
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    match cli.command {
        Command::Optimize {
            graph,
            cluster,
            devices,
            costs,
            knobs,
            compute_margin,
            min_execution_time,
            strategy,
            output,
            report,
        } => {
            let options = SessionOptions {
                cluster,
                devices,
                costs,
                knobs,
                compute_margin,
                min_execution_time,
                strategy: strategy.map(Into::into),
            };
            let mut session = PlacementSession::new(&options)?;
            let input = load_graph(&graph)?;
            let result = session.optimize(&input)?;

            info!(
                moved = result.report.moved(),
                external_cost_before = result.report.external_cost_before,
                external_cost_after = result.report.external_cost_after,
                "placement completed"
            );

            match output {
                Some(path) => write_graph(&result.graph, &path)?,
                None => println!("{}", result.graph.to_json()?),
            }
            if let Some(path) = report {
                result.report.save(&path)?;
            }
        }
        Command::Stats { graph, costs } => {
            let input = load_graph(&graph)?;
            let stats = GraphStats::collect(&input);
            println!(
                "nodes={}, data_edges={}, control_edges={}, unassigned={}",
                stats.nodes, stats.data_edges, stats.control_edges, stats.unassigned
            );
            for (device, count) in &stats.per_device {
                println!("- {}: {} nodes", device, count);
            }

            let options = SessionOptions {
                costs,
                ..SessionOptions::default()
            };
            let mut estimator = options.resolve_estimator()?;
            estimator.initialize(&input)?;
            let estimate = estimator.predict_costs(&input)?;
            let cost_stats = CostStats::collect(&input, &estimate);
            println!(
                "estimator={}, execution_time={}, compute_cost={}",
                estimator.name(),
                cost_stats.summary.execution_time,
                cost_stats.total_compute_cost
            );
            println!(
                "memory_size={}, missing_costs={}",
                cost_stats.total_memory_size, cost_stats.nodes_without_cost
            );
        }
        Command::EmitSample => {
            println!("{}", sample_graph()?.to_json()?);
        }
    }
    Ok(())
}

/// Two matmul towers joined by a concat, spread over two GPUs.
pub fn sample_graph() -> Result<GraphDef> {
    GraphBuilder::new()
        .with_id("sample-two-tower")
        .with_versions(1087, 0)
        .add_placeholder("input", "/job:localhost/replica:0/task:0/device:CPU:0")
        .add_op("w0", "VariableV2", "/job:localhost/replica:0/task:0/device:GPU:0", &[])
        .add_op("w1", "VariableV2", "/job:localhost/replica:0/task:0/device:GPU:1", &[])
        .add_matmul("tower0/mm", "/job:localhost/replica:0/task:0/device:GPU:0", "input", "w0")
        .add_matmul("tower1/mm", "/job:localhost/replica:0/task:0/device:GPU:1", "input", "w1")
        .add_op(
            "tower1/add",
            "Add",
            "/job:localhost/replica:0/task:0/device:GPU:0",
            &["tower1/mm", "tower0/mm"],
        )
        .add_op(
            "concat",
            "ConcatV2",
            "/job:localhost/replica:0/task:0/device:GPU:1",
            &["tower0/mm", "tower1/add", "^input"],
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_graph_is_consistent() -> Result<()> {
        let graph = sample_graph()?;
        graph.validate_references()?;
        assert_eq!(graph.len(), 7);
        Ok(())
    }

    #[test]
    fn test_cli_parses_device_list() {
        let cli = Cli::parse_from([
            "placeforge",
            "optimize",
            "--graph",
            "g.json",
            "--devices",
            "/device:GPU:0,/device:GPU:1",
            "--strategy",
            "default-device",
        ]);
        match cli.command {
            Command::Optimize {
                devices, strategy, ..
            } => {
                assert_eq!(devices.len(), 2);
                assert!(matches!(strategy, Some(StrategyArg::DefaultDevice)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
