use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use capex_risk_core::monte_carlo::distribution;
use capex_risk_core::monte_carlo::simulation::{
    self, ProjectSimulationInput, SimulationConfig,
};

use super::valuation::ProjectionFlags;
use crate::input;

/// Arguments for a Monte Carlo NPV simulation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SimulateArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Year-0 outlay, entered as a negative flow
    #[arg(long)]
    pub initial_outlay: Option<Decimal>,

    /// Base discount rate
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Number of trials
    #[arg(long, default_value = "10000")]
    pub trials: u32,

    /// Std dev of the revenue shock
    #[arg(long, default_value = "0.10")]
    pub revenue_volatility: f64,

    /// Std dev of the cost shock
    #[arg(long, default_value = "0.08")]
    pub cost_volatility: f64,

    /// Annual revenue growth applied before the shock
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub revenue_drift: f64,

    /// Annual cost growth applied before the shock
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub cost_drift: f64,

    /// Draw a discount-rate shock per trial
    #[arg(long)]
    pub randomize_discount_rate: bool,

    /// Std dev of the discount-rate shock
    #[arg(long, default_value = "0.02")]
    pub discount_rate_volatility: f64,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Include every trial's present value in the output
    #[arg(long)]
    pub include_outcomes: bool,

    #[command(flatten)]
    pub projection: ProjectionFlags,
}

/// Outcome vector, either bare or wrapped in an object.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomesFile {
    Bare(Vec<f64>),
    Wrapped { outcomes: Vec<f64> },
}

impl OutcomesFile {
    fn into_outcomes(self) -> Vec<f64> {
        match self {
            OutcomesFile::Bare(v) | OutcomesFile::Wrapped { outcomes: v } => v,
        }
    }
}

/// Arguments for summarising an outcome vector
#[derive(Args)]
pub struct SummarizeArgs {
    /// Path to JSON or YAML file holding the outcomes
    #[arg(long)]
    pub input: Option<String>,

    /// Outcomes (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub outcomes: Option<Vec<f64>>,
}

fn config_from_flags(args: &SimulateArgs) -> SimulationConfig {
    SimulationConfig {
        trial_count: args.trials,
        revenue_volatility: args.revenue_volatility,
        cost_volatility: args.cost_volatility,
        revenue_drift: args.revenue_drift,
        cost_drift: args.cost_drift,
        randomize_discount_rate: args.randomize_discount_rate,
        discount_rate_volatility: args.discount_rate_volatility,
    }
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: ProjectSimulationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ProjectSimulationInput {
            schedule: args.projection.to_schedule()?,
            initial_outlay: args
                .initial_outlay
                .ok_or("--initial-outlay is required (or provide --input)")?,
            discount_rate: args
                .discount_rate
                .ok_or("--discount-rate is required (or provide --input)")?,
            config: config_from_flags(&args),
            seed: args.seed,
            include_outcomes: args.include_outcomes,
        }
    };

    let result = simulation::run_project_simulation(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_summarize(args: SummarizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let outcomes: Vec<f64> = if let Some(ref path) = args.input {
        input::file::read_input::<OutcomesFile>(path)?.into_outcomes()
    } else if let Some(values) = args.outcomes {
        values
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value::<OutcomesFile>(data)?.into_outcomes()
    } else {
        return Err("--outcomes, --input <file> or stdin required".into());
    };

    let summary = distribution::summarize(&outcomes).ok_or("At least one outcome is required")?;
    Ok(serde_json::to_value(summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: SimulateArgs,
    }

    #[test]
    fn test_drift_flags_reach_the_config() {
        let h = Harness::try_parse_from([
            "capex",
            "--revenue-drift",
            "0.03",
            "--cost-drift",
            "-0.01",
            "--trials",
            "200",
        ])
        .unwrap();
        let config = config_from_flags(&h.args);
        assert_eq!(config.revenue_drift, 0.03);
        assert_eq!(config.cost_drift, -0.01);
        assert_eq!(config.trial_count, 200);
    }

    #[test]
    fn test_drift_defaults_to_zero() {
        let h = Harness::try_parse_from(["capex"]).unwrap();
        let config = config_from_flags(&h.args);
        assert_eq!(config.revenue_drift, 0.0);
        assert_eq!(config.cost_drift, 0.0);
    }
}
