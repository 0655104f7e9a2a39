use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use capex_risk_core::narrative::fallback::fallback_narrative;
use capex_risk_core::narrative::payload::NarrativePayload;
use capex_risk_core::valuation::appraisal;

use crate::input;

/// Arguments for the local commentary
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NarrativeArgs {
    /// Appraisal input file (JSON or YAML); appraised first, then narrated
    #[arg(long)]
    pub input: Option<String>,

    /// Project name
    #[arg(long, default_value = "Project")]
    pub project_name: String,

    /// Initial investment (positive amount)
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Discount rate the figures were computed at
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Net present value
    #[arg(long)]
    pub npv: Option<Decimal>,

    /// Internal rate of return, omitted when none exists
    #[arg(long)]
    pub irr: Option<Decimal>,
}

fn payload_from_file(path: &str) -> Result<NarrativePayload, Box<dyn std::error::Error>> {
    let appraisal_input: appraisal::AppraisalInput = input::file::read_input(path)?;
    let output = appraisal::appraise_project(&appraisal_input)?;
    Ok(NarrativePayload::from_appraisal(&appraisal_input, &output.result))
}

pub fn run_narrative(args: NarrativeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payload = if let Some(ref path) = args.input {
        payload_from_file(path)?
    } else {
        NarrativePayload {
            project_name: args.project_name,
            initial_investment: args
                .initial_investment
                .ok_or("--initial-investment is required (or provide --input)")?,
            discount_rate: args
                .discount_rate
                .ok_or("--discount-rate is required (or provide --input)")?,
            npv: args.npv.ok_or("--npv is required (or provide --input)")?,
            irr: args.irr,
        }
    };

    let narrative = fallback_narrative(&payload);
    Ok(json!({
        "result": narrative,
        "cache_key": payload.canonical_key()?,
    }))
}
