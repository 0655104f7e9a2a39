use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use capex_risk_core::projection::cash_flow::{apply_scenario_multiplier, ScenarioMultipliers};
use capex_risk_core::types::{CashFlowSchedule, Money, Rate};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Time value
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NpvInput {
    rate: Rate,
    cash_flows: Vec<Money>,
}

#[derive(Deserialize)]
struct IrrInput {
    cash_flows: Vec<Money>,
    #[serde(default = "default_guess")]
    guess: Rate,
}

fn default_guess() -> Rate {
    Decimal::new(10, 2)
}

#[derive(Deserialize)]
struct RealRateInput {
    nominal: Rate,
    inflation: Rate,
}

#[napi]
pub fn npv(input_json: String) -> NapiResult<String> {
    let input: NpvInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value =
        capex_risk_core::time_value::npv(input.rate, &input.cash_flows).map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "npv": value })).map_err(to_napi_error)
}

#[napi]
pub fn irr(input_json: String) -> NapiResult<String> {
    let input: IrrInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value =
        capex_risk_core::time_value::irr(&input.cash_flows, input.guess).map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "irr": value })).map_err(to_napi_error)
}

#[napi]
pub fn real_rate(input_json: String) -> NapiResult<String> {
    let input: RealRateInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = capex_risk_core::time_value::real_rate_from_nominal(input.nominal, input.inflation)
        .map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "real_rate": value })).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Appraisal and schedules
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ExportScheduleInput {
    schedule: CashFlowSchedule,
    #[serde(default = "ScenarioMultipliers::base")]
    multipliers: ScenarioMultipliers,
}

#[napi]
pub fn appraise_project(input_json: String) -> NapiResult<String> {
    let input: capex_risk_core::valuation::appraisal::AppraisalInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capex_risk_core::valuation::appraisal::appraise_project(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn export_schedule(input_json: String) -> NapiResult<String> {
    let input: ExportScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    input.schedule.validate().map_err(to_napi_error)?;
    let scheduled = apply_scenario_multiplier(
        &input.schedule,
        input.multipliers.revenue,
        input.multipliers.cost,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&scheduled.records()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Monte Carlo
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SummarizeInput {
    outcomes: Vec<f64>,
}

#[napi]
pub fn run_project_simulation(input_json: String) -> NapiResult<String> {
    let input: capex_risk_core::monte_carlo::simulation::ProjectSimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capex_risk_core::monte_carlo::simulation::run_project_simulation(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Returns `null` for an empty outcome vector.
#[napi]
pub fn summarize_outcomes(input_json: String) -> NapiResult<String> {
    let input: SummarizeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let summary = capex_risk_core::monte_carlo::distribution::summarize(&input.outcomes);
    serde_json::to_string(&summary).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Risk matrix
// ---------------------------------------------------------------------------

#[napi]
pub fn assess_project_risks(input_json: String) -> NapiResult<String> {
    let input: capex_risk_core::risk_matrix::assessment::RiskAssessmentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capex_risk_core::risk_matrix::assessment::assess_project_risks(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

#[napi]
pub fn fallback_narrative(input_json: String) -> NapiResult<String> {
    let payload: capex_risk_core::narrative::payload::NarrativePayload =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let narrative = capex_risk_core::narrative::fallback::fallback_narrative(&payload);
    serde_json::to_string(&narrative).map_err(to_napi_error)
}

/// Cache key the host should use when storing generated commentary.
#[napi]
pub fn narrative_cache_key(input_json: String) -> NapiResult<String> {
    let payload: capex_risk_core::narrative::payload::NarrativePayload =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    payload.canonical_key().map_err(to_napi_error)
}
