use clap::Args;
use serde_json::Value;

use capex_risk_core::risk_matrix::assessment::{self, RiskAssessmentInput, RiskItem};

use crate::input;

/// Arguments for the probability × impact assessment
#[derive(Args)]
pub struct RiskMatrixArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Risk as "name:probability:impact" (repeatable, ratings 1-5)
    #[arg(long = "risk")]
    pub risks: Vec<String>,

    /// Number of mitigations to return
    #[arg(long, default_value = "2")]
    pub top_k: usize,
}

fn parse_risk(spec: &str) -> Result<RiskItem, Box<dyn std::error::Error>> {
    let mut parts = spec.rsplitn(3, ':');
    let impact = parts.next();
    let probability = parts.next();
    let name = parts.next();
    match (name, probability, impact) {
        (Some(name), Some(p), Some(i)) if !name.trim().is_empty() => Ok(RiskItem {
            name: name.trim().to_string(),
            probability: p.trim().parse()?,
            impact: i.trim().parse()?,
        }),
        _ => Err(format!("Invalid --risk '{spec}', expected name:probability:impact").into()),
    }
}

pub fn run_risk_matrix(args: RiskMatrixArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let risk_input: RiskAssessmentInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if !args.risks.is_empty() {
        RiskAssessmentInput {
            items: args
                .risks
                .iter()
                .map(|s| parse_risk(s))
                .collect::<Result<Vec<_>, _>>()?,
            top_k: args.top_k,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--risk name:p:i, --input <file> or stdin required".into());
    };

    let result = assessment::assess_project_risks(&risk_input)?;
    Ok(serde_json::to_value(result)?)
}
