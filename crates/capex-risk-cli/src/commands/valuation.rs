use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use capex_risk_core::projection::cash_flow::{
    apply_scenario_multiplier, project_schedule, ScenarioMultipliers,
};
use capex_risk_core::time_value;
use capex_risk_core::types::CashFlowSchedule;
use capex_risk_core::valuation::appraisal::{self, AppraisalInput};

use crate::input;

/// Flags that describe a trend-projected schedule
#[derive(Args, Clone)]
pub struct ProjectionFlags {
    /// First-year revenue
    #[arg(long)]
    pub base_revenue: Option<Decimal>,

    /// First-year operating cost
    #[arg(long)]
    pub base_cost: Option<Decimal>,

    /// Annual revenue growth (e.g. 0.05 for 5%)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub trend_revenue: Decimal,

    /// Annual cost growth
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub trend_cost: Decimal,

    /// Projection years
    #[arg(long, default_value = "5")]
    pub years: u32,
}

impl ProjectionFlags {
    pub fn to_schedule(&self) -> Result<CashFlowSchedule, Box<dyn std::error::Error>> {
        let revenue = self
            .base_revenue
            .ok_or("--base-revenue is required (or provide --input)")?;
        let cost = self
            .base_cost
            .ok_or("--base-cost is required (or provide --input)")?;
        Ok(project_schedule(
            revenue,
            cost,
            self.trend_revenue,
            self.trend_cost,
            self.years,
        )?)
    }
}

/// Arguments for NPV
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NpvArgs {
    /// Discount rate per period (e.g. 0.10 for 10%)
    #[arg(long)]
    pub rate: Decimal,

    /// Cash flows from time 0 (comma-separated, e.g. "-1000,300,400,500")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,
}

/// Arguments for IRR
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct IrrArgs {
    /// Cash flows from time 0 (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,

    /// Starting guess for the solver
    #[arg(long, default_value = "0.10")]
    pub guess: Decimal,
}

/// Arguments for the Fisher real rate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RealRateArgs {
    /// Nominal rate
    #[arg(long)]
    pub nominal: Decimal,

    /// Expected inflation
    #[arg(long)]
    pub inflation: Decimal,
}

/// Arguments for a full project appraisal
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AppraiseArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Project name
    #[arg(long, default_value = "Project")]
    pub project_name: String,

    /// Year-0 outlay, entered as a negative flow
    #[arg(long)]
    pub initial_outlay: Option<Decimal>,

    /// Nominal discount rate
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Expected inflation; switches discounting to the real rate
    #[arg(long)]
    pub inflation_rate: Option<Decimal>,

    #[command(flatten)]
    pub projection: ProjectionFlags,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Scenario {
    Base,
    Optimistic,
    Pessimistic,
}

impl Scenario {
    fn multipliers(self) -> ScenarioMultipliers {
        match self {
            Scenario::Base => ScenarioMultipliers::base(),
            Scenario::Optimistic => ScenarioMultipliers::optimistic(),
            Scenario::Pessimistic => ScenarioMultipliers::pessimistic(),
        }
    }
}

/// File form of the schedule export: an explicit schedule plus an optional
/// scenario overlay.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleFile {
    pub schedule: CashFlowSchedule,
    #[serde(default = "ScenarioMultipliers::base")]
    pub multipliers: ScenarioMultipliers,
}

/// Arguments for the per-year schedule export
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScheduleArgs {
    /// Path to JSON or YAML input file with an explicit schedule
    #[arg(long)]
    pub input: Option<String>,

    /// Scenario overlay applied to a flag-built schedule
    #[arg(long, value_enum, default_value = "base")]
    pub scenario: Scenario,

    #[command(flatten)]
    pub projection: ProjectionFlags,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = time_value::npv(args.rate, &args.cash_flows)?;
    Ok(json!({ "npv": value, "rate": args.rate, "periods": args.cash_flows.len() }))
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = time_value::irr(&args.cash_flows, args.guess)?;
    Ok(json!({ "irr": value, "periods": args.cash_flows.len() }))
}

pub fn run_real_rate(args: RealRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = time_value::real_rate_from_nominal(args.nominal, args.inflation)?;
    Ok(json!({
        "real_rate": value,
        "nominal": args.nominal,
        "inflation": args.inflation,
    }))
}

pub fn build_appraisal_input(
    args: &AppraiseArgs,
) -> Result<AppraisalInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Ok(AppraisalInput {
        project_name: args.project_name.clone(),
        schedule: args.projection.to_schedule()?,
        initial_outlay: args
            .initial_outlay
            .ok_or("--initial-outlay is required (or provide --input)")?,
        discount_rate: args
            .discount_rate
            .ok_or("--discount-rate is required (or provide --input)")?,
        inflation_rate: args.inflation_rate,
        irr_guess: dec!(0.10),
        optimistic: ScenarioMultipliers::optimistic(),
        pessimistic: ScenarioMultipliers::pessimistic(),
    })
}

pub fn run_appraise(args: AppraiseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let appraisal_input = build_appraisal_input(&args)?;
    let result = appraisal::appraise_project(&appraisal_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let file: ScheduleFile = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ScheduleFile {
            schedule: args.projection.to_schedule()?,
            multipliers: args.scenario.multipliers(),
        }
    };

    file.schedule.validate()?;
    let scheduled = apply_scenario_multiplier(
        &file.schedule,
        file.multipliers.revenue,
        file.multipliers.cost,
    )?;
    Ok(serde_json::to_value(scheduled.records())?)
}
