// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use netform::metrics::analyzer::{self, RunReport};
use netform::prelude::*;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long, default_value = "connections")]
        strategy: String,
        #[command(flatten)]
        params: RunParams,
        /// JSON config file, overrides every other flag
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    Compare {
        #[arg(short, long, default_value = "connections,co-author")]
        strategies: String,
        #[command(flatten)]
        params: RunParams,
        #[arg(short, long, default_value_t = 3)]
        repetitions: u32,
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    List,
}

#[derive(Args, Clone)]
struct RunParams {
    #[arg(short = 'n', long, default_value_t = 16)]
    agents: u32,
    #[arg(short, long, default_value_t = 0.5)]
    cost: f64,
    #[arg(short, long, default_value_t = 0.8)]
    alpha: f64,
    /// Require the partner not to lose when a link is created
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    mutual_create: bool,
    /// Require the partner not to lose when a link is deleted
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    mutual_delete: bool,
    #[arg(long, default_value_t = 1)]
    polling_interval: u64,
    #[arg(long)]
    check_stability: Option<u64>,
    #[arg(short, long, default_value_t = 100)]
    max_steps: u64,
    #[arg(long)]
    max_sample: Option<usize>,
    #[arg(long, default_value = "sequential")]
    schedule: SchedulePolicy,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(short = 'p', long, default_value_t = 0.0)]
    link_probability: f64,
}

impl RunParams {
    fn to_config(&self, name: String, strategy: &str) -> SimConfig {
        SimConfig {
            name,
            strategy_name: strategy.to_string(),
            num_agents: self.agents,
            cost: self.cost,
            alpha: self.alpha,
            mutual_create: self.mutual_create,
            mutual_delete: self.mutual_delete,
            polling_interval: self.polling_interval,
            check_stability: self.check_stability,
            defer_stability_to_cap: false,
            max_steps: Some(self.max_steps),
            max_sample: self.max_sample,
            schedule: self.schedule,
            seed: self.seed,
            initial_link_probability: self.link_probability,
        }
    }
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { strategy, params, config, output } => {
            let config = match config {
                Some(path) => SimConfig::from_json_file(path)?,
                None => params.to_config(format!("{}_{}", strategy, params.seed), &strategy),
            };
            run_single_simulation(config, &output)?;
        }

        Commands::Compare { strategies, params, repetitions, output } => {
            compare_strategies(&strategies, &params, repetitions, &output)?;
        }

        Commands::List => {
            println!("\nAvailable Strategies");

            for strategy in StrategyRegistry::global().list() {
                println!("  - {}", strategy);
            }

            println!("\nUsage: cargo run -- run --strategy <name>");
            println!("Example: cargo run -- run --strategy co-author -n 32 --cost 0.2\n");
        }
    }

    info!("Total runtime: {:.2}s", program_start.elapsed().as_secs_f64());

    Ok(())
}

fn run_single_simulation(config: SimConfig, output: &Path) -> Result<()> {
    info!("netform: Single Run");

    let mut world = World::new(config)?;

    let pb = match world.config().max_steps {
        Some(cap) => ProgressBar::new(cap),
        None => ProgressBar::no_length(),
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} steps {msg}")?
            .progress_chars("█▓░"),
    );

    let reason = world.run_with_progress(&pb);
    info!("Stopped: {:?} at step {}", reason, world.time());

    world.save_results(output)?;
    Ok(())
}

fn compare_strategies(
    strategies: &str,
    params: &RunParams,
    repetitions: u32,
    output: &Path,
) -> Result<()> {
    let strategy_names: Vec<&str> = strategies.split(',').map(|s| s.trim()).collect();

    info!("netform: Comparison");
    info!("Strategies: {}", strategy_names.join(", "));
    info!("Repetitions: {}", repetitions);

    let mut all_reports = Vec::new();

    for strategy_name in strategy_names {
        info!("Testing: {}", strategy_name);

        // each repetition owns its world, seeds are offset per repetition
        let reports: Vec<RunReport> = (0..repetitions)
            .into_par_iter()
            .map(|rep| -> Result<RunReport> {
                let config = params
                    .to_config(format!("{}_{}", strategy_name, rep), strategy_name)
                    .with_seed(params.seed.wrapping_add(u64::from(rep)));
                let mut world = World::new(config)?;
                world.run();
                Ok(analyzer::analyze(&world))
            })
            .collect::<Result<_>>()?;

        if let Some(avg) = analyzer::average_reports(&reports) {
            all_reports.push(avg);
        }
    }

    comparison_table(&all_reports);

    std::fs::create_dir_all(output)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let comparison_path = output.join(format!("comparison_{}.json", timestamp));
    analyzer::export_json(&all_reports, &comparison_path)?;
    info!("Comparison saved to: {}", comparison_path.display());

    Ok(())
}

fn comparison_table(reports: &[RunReport]) {
    println!("\n╔═══════════════╦═══════╦═════════╦═══════════╦═══════════╦════════════╦════════════╗");
    println!("║ Strategy      ║ Steps ║ Stable  ║ Welfare   ║ Density   ║ Clustering ║ Components ║");
    println!("╠═══════════════╬═══════╬═════════╬═══════════╬═══════════╬════════════╬════════════╣");

    for report in reports {
        println!(
            "║ {:<13} ║ {:>5} ║ {:>6.0}% ║ {:>9.3} ║ {:>9.3} ║ {:>10.3} ║ {:>10.1} ║",
            report.strategy_name,
            report.steps,
            report.stable_rate * 100.0,
            report.final_welfare,
            report.final_density,
            report.final_clustering,
            report.final_components,
        );
    }

    println!("╚═══════════════╩═══════╩═════════╩═══════════╩═══════════╩════════════╩════════════╝\n");

    if let Some(best) = reports
        .iter()
        .max_by(|a, b| a.final_welfare.total_cmp(&b.final_welfare))
    {
        println!("Top Welfare: {} ({:.3})", best.strategy_name, best.final_welfare);
    }

    println!();
}
