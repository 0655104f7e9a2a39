use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CapexRiskError;
use crate::CapexRiskResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// One projected year of a capital project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    /// Elapsed years from time 0 (first operating year is 1)
    pub year: u32,
    pub revenue: Money,
    pub cost: Money,
}

impl CashFlowRow {
    pub fn net(&self) -> Money {
        self.revenue - self.cost
    }
}

/// Ordered projection of revenue and cost per year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    pub rows: Vec<CashFlowRow>,
}

/// Flat export record: one row per year with net flow materialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub year: u32,
    pub revenue: Money,
    pub cost: Money,
    pub net: Money,
}

impl CashFlowSchedule {
    pub fn new(rows: Vec<CashFlowRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Checks the schedule is non-empty, years run 1, 2, .., n and no
    /// revenue or cost is negative.
    pub fn validate(&self) -> CapexRiskResult<()> {
        if self.rows.is_empty() {
            return Err(CapexRiskError::InsufficientData(
                "Cash flow schedule requires at least one year".into(),
            ));
        }
        for (i, row) in self.rows.iter().enumerate() {
            let expected = i as u32 + 1;
            if row.year != expected {
                return Err(CapexRiskError::InvalidInput {
                    field: format!("rows[{i}].year"),
                    reason: format!("Expected year {expected}, got {}", row.year),
                });
            }
            if row.revenue < Decimal::ZERO {
                return Err(CapexRiskError::InvalidInput {
                    field: format!("rows[{i}].revenue"),
                    reason: "Revenue cannot be negative".into(),
                });
            }
            if row.cost < Decimal::ZERO {
                return Err(CapexRiskError::InvalidInput {
                    field: format!("rows[{i}].cost"),
                    reason: "Cost cannot be negative".into(),
                });
            }
        }
        Ok(())
    }

    /// Net flows prefixed by the year-0 outlay: `[C0, C1, .., Cn]`.
    pub fn to_series(&self, initial_outlay: Money) -> Vec<Money> {
        std::iter::once(initial_outlay)
            .chain(self.rows.iter().map(CashFlowRow::net))
            .collect()
    }

    pub fn records(&self) -> Vec<ScheduleRecord> {
        self.rows
            .iter()
            .map(|r| ScheduleRecord {
                year: r.year,
                revenue: r.revenue,
                cost: r.cost,
                net: r.net(),
            })
            .collect()
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
