//! Deterministic baseline appraisal of a capital project: NPV, IRR,
//! profitability index and discounted payback, plus the same metrics for
//! optimistic and pessimistic scenario variants.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use super::decision::{investment_verdict, Verdict};
use crate::projection::cash_flow::{apply_scenario_multiplier, ScenarioMultipliers};
use crate::error::CapexRiskError;
use crate::time_value::{irr, npv, real_rate_from_nominal};
use crate::types::{with_metadata, CashFlowSchedule, ComputationOutput, Money, Rate};
use crate::CapexRiskResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppraisalInput {
    pub project_name: String,
    pub schedule: CashFlowSchedule,
    /// Year-0 flow, normally negative.
    pub initial_outlay: Money,
    /// Nominal discount rate.
    pub discount_rate: Rate,
    /// When present, cash flows are discounted at the real rate instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<Rate>,
    /// Starting point for the IRR solver.
    #[serde(default = "default_irr_guess")]
    pub irr_guess: Rate,
    #[serde(default = "ScenarioMultipliers::optimistic")]
    pub optimistic: ScenarioMultipliers,
    #[serde(default = "ScenarioMultipliers::pessimistic")]
    pub pessimistic: ScenarioMultipliers,
}

fn default_irr_guess() -> Rate {
    dec!(0.10)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioValuation {
    pub scenario: String,
    pub revenue_multiplier: Decimal,
    pub cost_multiplier: Decimal,
    pub npv: Money,
    pub irr: Option<Rate>,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppraisalOutput {
    pub project_name: String,
    /// Rate actually used for discounting (real if inflation was given).
    pub effective_discount_rate: Rate,
    pub npv: Money,
    /// `None` when the IRR solver found no root.
    pub irr: Option<Rate>,
    /// PV of years 1..n over the absolute outlay.
    pub profitability_index: Option<Decimal>,
    /// Years until cumulative discounted flow turns non-negative.
    pub discounted_payback_years: Option<Decimal>,
    /// Undiscounted sum of the full series, outlay included.
    pub total_net_cash_flow: Money,
    pub verdict: Verdict,
    pub scenarios: Vec<ScenarioValuation>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// IRR that maps every solver failure to `None` plus a warning.
fn irr_or_none(
    series: &[Money],
    guess: Rate,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<Rate> {
    match irr(series, guess) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!(scenario = label, error = %e, "IRR not available");
            warnings.push(format!("IRR not available for {label} case: {e}"));
            None
        }
    }
}

fn overflow(function: &str) -> CapexRiskError {
    CapexRiskError::DomainError {
        function: function.into(),
        reason: "Decimal overflow".into(),
    }
}

fn discounted_payback(series: &[Money], rate: Rate) -> CapexRiskResult<Option<Decimal>> {
    let Some(first) = series.first() else {
        return Ok(None);
    };
    if *first >= Decimal::ZERO {
        return Ok(Some(Decimal::ZERO));
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut cumulative = *first;

    for (t, cf) in series.iter().enumerate().skip(1) {
        discount = discount
            .checked_mul(one_plus_r)
            .ok_or_else(|| overflow("discounted_payback"))?;
        let pv = cf
            .checked_div(discount)
            .ok_or_else(|| overflow("discounted_payback"))?;
        let previous = cumulative;
        cumulative = cumulative
            .checked_add(pv)
            .ok_or_else(|| overflow("discounted_payback"))?;
        if cumulative >= Decimal::ZERO {
            // interpolate inside the year
            let fraction = if pv > Decimal::ZERO {
                -previous / pv
            } else {
                Decimal::ZERO
            };
            return Ok(Some(Decimal::from(t as u64 - 1) + fraction));
        }
    }

    Ok(None)
}

// ---------------------------------------------------------------------------
// Main function
// ---------------------------------------------------------------------------

/// Appraise a project's baseline schedule and its scenario variants.
pub fn appraise_project(
    input: &AppraisalInput,
) -> CapexRiskResult<ComputationOutput<AppraisalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.schedule.validate()?;

    let effective_discount_rate = match input.inflation_rate {
        Some(inflation) => real_rate_from_nominal(input.discount_rate, inflation)?,
        None => input.discount_rate,
    };

    if input.initial_outlay > Decimal::ZERO {
        warnings.push("Initial outlay is positive; expected a cash outflow at year 0".into());
    }

    let series = input.schedule.to_series(input.initial_outlay);
    let base_npv = npv(effective_discount_rate, &series)?;
    let base_irr = irr_or_none(&series, input.irr_guess, "base", &mut warnings);

    let profitability_index = if input.initial_outlay.is_zero() {
        None
    } else {
        let inflows_pv = base_npv
            .checked_sub(input.initial_outlay)
            .ok_or_else(|| overflow("profitability_index"))?;
        Some(
            inflows_pv
                .checked_div(input.initial_outlay.abs())
                .ok_or_else(|| overflow("profitability_index"))?,
        )
    };

    let discounted_payback_years = discounted_payback(&series, effective_discount_rate)?;
    if discounted_payback_years.is_none() {
        warnings.push("Outlay is not recovered within the projection horizon".into());
    }

    let total_net_cash_flow = series
        .iter()
        .try_fold(Decimal::ZERO, |acc, cf| acc.checked_add(*cf))
        .ok_or_else(|| overflow("total_net_cash_flow"))?;
    let verdict = investment_verdict(base_npv, base_irr, effective_discount_rate);

    let mut scenarios = vec![ScenarioValuation {
        scenario: "base".into(),
        revenue_multiplier: Decimal::ONE,
        cost_multiplier: Decimal::ONE,
        npv: base_npv,
        irr: base_irr,
        verdict,
    }];

    let variants = [
        ("optimistic", input.optimistic),
        ("pessimistic", input.pessimistic),
    ];
    for (label, multipliers) in variants {
        let variant =
            apply_scenario_multiplier(&input.schedule, multipliers.revenue, multipliers.cost)?;
        let variant_series = variant.to_series(input.initial_outlay);
        let variant_npv = npv(effective_discount_rate, &variant_series)?;
        let variant_irr = irr_or_none(&variant_series, input.irr_guess, label, &mut warnings);
        scenarios.push(ScenarioValuation {
            scenario: label.into(),
            revenue_multiplier: multipliers.revenue,
            cost_multiplier: multipliers.cost,
            npv: variant_npv,
            irr: variant_irr,
            verdict: investment_verdict(variant_npv, variant_irr, effective_discount_rate),
        });
    }

    let output = AppraisalOutput {
        project_name: input.project_name.clone(),
        effective_discount_rate,
        npv: base_npv,
        irr: base_irr,
        profitability_index,
        discounted_payback_years,
        total_net_cash_flow,
        verdict,
        scenarios,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Capital Project Appraisal (NPV / IRR / PI / discounted payback)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CashFlowRow;
    use pretty_assertions::assert_eq;

    fn single_year_input() -> AppraisalInput {
        AppraisalInput {
            project_name: "Plant A".into(),
            schedule: CashFlowSchedule::new(vec![CashFlowRow {
                year: 1,
                revenue: dec!(450000000),
                cost: dec!(220000000),
            }]),
            initial_outlay: dec!(-800000000),
            discount_rate: dec!(0.25),
            inflation_rate: None,
            irr_guess: default_irr_guess(),
            optimistic: ScenarioMultipliers::optimistic(),
            pessimistic: ScenarioMultipliers::pessimistic(),
        }
    }

    fn annuity_input() -> AppraisalInput {
        AppraisalInput {
            project_name: "Line B".into(),
            schedule: CashFlowSchedule::new(
                (1..=5)
                    .map(|year| CashFlowRow {
                        year,
                        revenue: dec!(700),
                        cost: dec!(400),
                    })
                    .collect(),
            ),
            initial_outlay: dec!(-1000),
            discount_rate: dec!(0.08),
            ..single_year_input()
        }
    }

    #[test]
    fn test_single_year_project_npv() {
        let out = appraise_project(&single_year_input()).unwrap();
        assert_eq!(out.result.npv, dec!(-616000000));
        assert_eq!(out.result.verdict, Verdict::Reject);
        assert_eq!(out.result.discounted_payback_years, None);
        assert_eq!(out.result.total_net_cash_flow, dec!(-570000000));
        // IRR = 230/800 - 1
        let irr = out.result.irr.unwrap();
        assert!((irr - dec!(-0.7125)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_annuity_project_accepts() {
        let out = appraise_project(&annuity_input()).unwrap();
        let r = &out.result;
        assert!(r.npv > Decimal::ZERO);
        assert_eq!(r.verdict, Verdict::Accept);
        let irr = r.irr.unwrap();
        assert!(irr > dec!(0.15) && irr < dec!(0.16), "irr={irr}");
        let pi = r.profitability_index.unwrap();
        assert!((pi - (r.npv + dec!(1000)) / dec!(1000)).abs() < dec!(0.0000001));
        let payback = r.discounted_payback_years.unwrap();
        assert!(payback > dec!(3) && payback < dec!(5), "payback={payback}");
    }

    #[test]
    fn test_scenarios_bracket_base() {
        let out = appraise_project(&annuity_input()).unwrap();
        let s = &out.result.scenarios;
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].scenario, "base");
        assert!(s[1].npv > s[0].npv);
        assert!(s[2].npv < s[0].npv);
    }

    #[test]
    fn test_inflation_switches_to_real_rate() {
        let mut input = annuity_input();
        input.discount_rate = dec!(0.155);
        input.inflation_rate = Some(dec!(0.05));
        let out = appraise_project(&input).unwrap();
        assert_eq!(out.result.effective_discount_rate, dec!(0.1));
    }

    #[test]
    fn test_irr_failure_is_reported_not_fatal() {
        let mut input = annuity_input();
        input.initial_outlay = dec!(0);
        let out = appraise_project(&input).unwrap();
        assert_eq!(out.result.irr, None);
        assert_eq!(out.result.profitability_index, None);
        assert_eq!(out.result.discounted_payback_years, Some(Decimal::ZERO));
        assert_eq!(out.result.verdict, Verdict::NeedsOptimization);
        assert!(out.warnings.iter().any(|w| w.contains("IRR not available")));
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let mut input = annuity_input();
        input.schedule.rows.clear();
        assert!(appraise_project(&input).is_err());
    }

    #[test]
    fn test_defaults_from_json() {
        let input: AppraisalInput = serde_json::from_str(
            r#"{
                "project_name": "P",
                "schedule": {"rows": [{"year": 1, "revenue": "10", "cost": "4"}]},
                "initial_outlay": "-5",
                "discount_rate": "0.1"
            }"#,
        )
        .unwrap();
        assert_eq!(input.irr_guess, dec!(0.10));
        assert_eq!(input.optimistic, ScenarioMultipliers::optimistic());
    }

    #[test]
    fn test_scenario_overflow_is_an_error() {
        let input: AppraisalInput = serde_json::from_value(serde_json::json!({
            "project_name": "Mega",
            "schedule": { "rows": [
                { "year": 1, "revenue": "1000000000000000000000000000", "cost": "0" }
            ] },
            "initial_outlay": "-1000",
            "discount_rate": "0.10",
            "optimistic": { "revenue": "1000", "cost": "1" }
        }))
        .unwrap();
        assert!(matches!(
            appraise_project(&input),
            Err(CapexRiskError::InvalidInput { .. })
        ));
    }
}
