mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::narrative::NarrativeArgs;
use commands::risk::RiskMatrixArgs;
use commands::simulation::{SimulateArgs, SummarizeArgs};
use commands::valuation::{AppraiseArgs, IrrArgs, NpvArgs, RealRateArgs, ScheduleArgs};

/// Capital project valuation and risk analysis
#[derive(Parser)]
#[command(
    name = "capex",
    version,
    about = "Capital project valuation and risk analysis",
    long_about = "Appraise capital projects with decimal-precision NPV and IRR, \
                  stress them with Monte Carlo simulation, and rank their \
                  qualitative risks on a probability x impact matrix."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Net present value of a cash-flow series
    Npv(NpvArgs),
    /// Internal rate of return of a cash-flow series
    Irr(IrrArgs),
    /// Real rate from a nominal rate and inflation (Fisher)
    RealRate(RealRateArgs),
    /// Full project appraisal with scenario variants
    Appraise(AppraiseArgs),
    /// Export a per-year revenue/cost/net schedule
    Schedule(ScheduleArgs),
    /// Monte Carlo NPV simulation
    Simulate(SimulateArgs),
    /// Distribution summary of an outcome vector
    Summarize(SummarizeArgs),
    /// Probability x impact risk matrix with mitigations
    RiskMatrix(RiskMatrixArgs),
    /// Rule-based commentary for an appraisal
    Narrative(NarrativeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries results, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Npv(args) => commands::valuation::run_npv(args),
        Commands::Irr(args) => commands::valuation::run_irr(args),
        Commands::RealRate(args) => commands::valuation::run_real_rate(args),
        Commands::Appraise(args) => commands::valuation::run_appraise(args),
        Commands::Schedule(args) => commands::valuation::run_schedule(args),
        Commands::Simulate(args) => commands::simulation::run_simulate(args),
        Commands::Summarize(args) => commands::simulation::run_summarize(args),
        Commands::RiskMatrix(args) => commands::risk::run_risk_matrix(args),
        Commands::Narrative(args) => commands::narrative::run_narrative(args),
        Commands::Version => {
            println!("capex {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
