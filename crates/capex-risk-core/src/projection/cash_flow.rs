//! Deterministic revenue/cost projection and scenario scaling.
//!
//! The same compounding rule drives the baseline schedule and the drifted
//! template that the Monte Carlo simulator perturbs.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CapexRiskError;
use crate::types::{CashFlowRow, CashFlowSchedule, Money, Rate};
use crate::CapexRiskResult;

/// Revenue and cost multipliers that turn a base schedule into a variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMultipliers {
    pub revenue: Decimal,
    pub cost: Decimal,
}

impl ScenarioMultipliers {
    pub fn base() -> Self {
        Self {
            revenue: Decimal::ONE,
            cost: Decimal::ONE,
        }
    }

    pub fn optimistic() -> Self {
        Self {
            revenue: dec!(1.10),
            cost: dec!(0.95),
        }
    }

    pub fn pessimistic() -> Self {
        Self {
            revenue: dec!(0.90),
            cost: dec!(1.05),
        }
    }
}

fn growth_factor(trend: Rate, year_index: u32) -> CapexRiskResult<Decimal> {
    (Decimal::ONE + trend)
        .checked_powu(u64::from(year_index))
        .ok_or_else(|| CapexRiskError::InvalidInput {
            field: "trend".into(),
            reason: format!("Compound growth overflows at year offset {year_index}"),
        })
}

fn scaled(field: &str, value: Money, factor: Decimal) -> CapexRiskResult<Money> {
    value
        .checked_mul(factor)
        .ok_or_else(|| CapexRiskError::InvalidInput {
            field: field.into(),
            reason: format!("{value} x {factor} overflows"),
        })
}

/// Compound `base × (1+trend)^year_index` for revenue and cost.
pub fn project_year(
    base_revenue: Money,
    base_cost: Money,
    trend_revenue: Rate,
    trend_cost: Rate,
    year_index: u32,
) -> CapexRiskResult<(Money, Money)> {
    let revenue = scaled("revenue", base_revenue, growth_factor(trend_revenue, year_index)?)?;
    let cost = scaled("cost", base_cost, growth_factor(trend_cost, year_index)?)?;
    Ok((revenue, cost))
}

/// Floating-point variant of [`project_year`] for the simulation path.
pub fn project_year_f64(
    base_revenue: f64,
    base_cost: f64,
    trend_revenue: f64,
    trend_cost: f64,
    year_index: u32,
) -> (f64, f64) {
    let n = year_index as i32;
    (
        base_revenue * (1.0 + trend_revenue).powi(n),
        base_cost * (1.0 + trend_cost).powi(n),
    )
}

/// Build a `years`-long schedule starting from first-year values.
///
/// Year `y` sits at offset `y - 1`, so year 1 carries the base values.
pub fn project_schedule(
    base_revenue: Money,
    base_cost: Money,
    trend_revenue: Rate,
    trend_cost: Rate,
    years: u32,
) -> CapexRiskResult<CashFlowSchedule> {
    if years == 0 {
        return Err(CapexRiskError::InvalidInput {
            field: "years".into(),
            reason: "Must project at least one year".into(),
        });
    }
    if base_revenue < Decimal::ZERO || base_cost < Decimal::ZERO {
        return Err(CapexRiskError::InvalidInput {
            field: "base_revenue/base_cost".into(),
            reason: "Base revenue and cost cannot be negative".into(),
        });
    }
    if trend_revenue <= dec!(-1) || trend_cost <= dec!(-1) {
        return Err(CapexRiskError::InvalidInput {
            field: "trend".into(),
            reason: "Trend must be greater than -100%".into(),
        });
    }

    let rows = (1..=years)
        .map(|year| {
            let (revenue, cost) =
                project_year(base_revenue, base_cost, trend_revenue, trend_cost, year - 1)?;
            Ok(CashFlowRow {
                year,
                revenue,
                cost,
            })
        })
        .collect::<CapexRiskResult<Vec<_>>>()?;

    Ok(CashFlowSchedule::new(rows))
}

/// Scale every row's revenue and cost; net is derived so it follows.
pub fn apply_scenario_multiplier(
    schedule: &CashFlowSchedule,
    revenue_multiplier: Decimal,
    cost_multiplier: Decimal,
) -> CapexRiskResult<CashFlowSchedule> {
    if revenue_multiplier < Decimal::ZERO || cost_multiplier < Decimal::ZERO {
        return Err(CapexRiskError::InvalidInput {
            field: "multiplier".into(),
            reason: "Scenario multipliers cannot be negative".into(),
        });
    }

    let rows = schedule
        .rows
        .iter()
        .map(|r| {
            Ok(CashFlowRow {
                year: r.year,
                revenue: scaled("revenue", r.revenue, revenue_multiplier)?,
                cost: scaled("cost", r.cost, cost_multiplier)?,
            })
        })
        .collect::<CapexRiskResult<Vec<_>>>()?;

    Ok(CashFlowSchedule::new(rows))
}
