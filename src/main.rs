//! Veldt - Entry Point
//!
//! Runs single episodes, headless evaluation batches, and replay
//! inspection from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use veldt::agents::build_agent;
use veldt::core::config::load_config;
use veldt::core::error::Result;
use veldt::eval::{compute_metrics, run_batch, run_episode};
use veldt::sim::replay::Replay;

#[derive(Parser)]
#[command(name = "veldt", about = "Wilderness survival simulation")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single episode
    Run {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Agent kind: heuristic, random, pso, llm
        #[arg(long, default_value = "heuristic")]
        agent: String,
        /// Override the configured step budget
        #[arg(long)]
        max_steps: Option<u64>,
        /// Where to write the replay JSON
        #[arg(long)]
        replay: Option<PathBuf>,
    },
    /// Run a batch of headless episodes and aggregate metrics
    Eval {
        #[arg(long, default_value_t = 10)]
        episodes: usize,
        #[arg(long, default_value_t = 0)]
        base_seed: u64,
        #[arg(long, default_value = "heuristic")]
        agent: String,
    },
    /// Print the summary and metrics of a saved replay
    Replay {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "veldt=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            seed,
            agent,
            max_steps,
            replay,
        } => {
            if let Some(steps) = max_steps {
                config.sim.max_steps = steps;
            }
            tracing::info!(
                seed,
                agent,
                map = format!("{}x{}", config.map.width, config.map.height),
                max_steps = config.sim.max_steps,
                "running episode"
            );

            let mut agent = build_agent(&agent, seed, &config)?;
            let result = run_episode(&config, seed, agent.as_mut())?;
            let metrics = compute_metrics(&result);

            println!("\n=== Episode Summary ===");
            println!(
                "  Survived: {} steps ({:.1} hours / {:.2} days)",
                metrics.survived_steps, metrics.survived_hours, metrics.survived_days
            );
            println!("  Cause of death: {:?}", metrics.cause_of_death);
            println!("  Trophy found: {}", metrics.trophy_found);
            println!("  Cells explored: {}", metrics.unique_cells_visited);
            println!("  Exploration rate: {:.3}", metrics.exploration_rate);
            println!("  Wildlife encounters: {}", metrics.encounter_count);

            if let Some(path) = replay {
                result.save(&path)?;
                println!("  Replay written to {}", path.display());
            }
        }
        Command::Eval {
            episodes,
            base_seed,
            agent,
        } => {
            let mut agent = build_agent(&agent, base_seed, &config)?;
            let report = run_batch(&config, agent.as_mut(), episodes, base_seed)?;

            println!("\n=== Evaluation Report ===");
            println!("  Episodes: {}", report.episodes);
            println!("  Mean steps survived: {:.1}", report.mean_survived_steps);
            println!("  Mean days survived: {:.2}", report.mean_survived_days);
            println!("  Trophy rate: {:.2}", report.trophy_rate);
            println!(
                "  Mean exploration rate: {:.3}",
                report.mean_exploration_rate
            );
            println!("  Death causes:");
            for (cause, count) in &report.death_causes {
                println!("    {}: {}", cause, count);
            }
        }
        Command::Replay { file } => {
            let replay = Replay::load(&file)?;
            let metrics = compute_metrics(&replay);
            println!("Replay: seed={} steps={}", replay.meta.seed, replay.steps.len());
            match &replay.summary {
                Some(summary) => {
                    println!(
                        "  Outcome: {:?} after {} steps ({:.1} days)",
                        summary.outcome, summary.survived_steps, summary.survived_days
                    );
                    println!("  Cause of death: {:?}", summary.cause_of_death);
                    println!(
                        "  Final position: ({}, {})",
                        summary.final_pos.x, summary.final_pos.y
                    );
                }
                None => println!("  (no summary recorded)"),
            }
            println!("  Cells explored: {}", metrics.unique_cells_visited);
            println!("  Wildlife encounters: {}", metrics.encounter_count);
        }
    }

    Ok(())
}
