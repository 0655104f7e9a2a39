use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Money, Rate};
use crate::valuation::appraisal::{AppraisalInput, AppraisalOutput};
use crate::CapexRiskResult;

/// Structured request sent to the commentary generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativePayload {
    pub project_name: String,
    pub initial_investment: Money,
    pub discount_rate: Rate,
    pub npv: Money,
    pub irr: Option<Rate>,
}

impl NarrativePayload {
    /// Payload for a completed appraisal, quoting the effective rate.
    pub fn from_appraisal(input: &AppraisalInput, output: &AppraisalOutput) -> Self {
        Self {
            project_name: input.project_name.clone(),
            initial_investment: input.initial_outlay.abs(),
            discount_rate: output.effective_discount_rate,
            npv: output.npv,
            irr: output.irr,
        }
    }

    /// Canonical cache key: JSON with keys in sorted order and decimals
    /// stripped of trailing zeros, so equal inputs always give equal keys.
    pub fn canonical_key(&self) -> CapexRiskResult<String> {
        let normalized = NarrativePayload {
            project_name: self.project_name.trim().to_string(),
            initial_investment: self.initial_investment.normalize(),
            discount_rate: self.discount_rate.normalize(),
            npv: self.npv.normalize(),
            irr: self.irr.map(|r| r.normalize()),
        };
        let sorted: BTreeMap<String, serde_json::Value> = match serde_json::to_value(&normalized)? {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        Ok(serde_json::to_string(&sorted)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload() -> NarrativePayload {
        NarrativePayload {
            project_name: "Plant A".into(),
            initial_investment: dec!(800000000),
            discount_rate: dec!(0.25),
            npv: dec!(-616000000),
            irr: Some(dec!(-0.7125)),
        }
    }

    #[test]
    fn test_key_sorted_and_stable() {
        let key = payload().canonical_key().unwrap();
        let disc = key.find("\"discount_rate\"").unwrap();
        let proj = key.find("\"project_name\"").unwrap();
        assert!(disc < proj);
        assert_eq!(key, payload().canonical_key().unwrap());
    }

    #[test]
    fn test_key_ignores_decimal_scale() {
        let mut other = payload();
        other.discount_rate = dec!(0.2500);
        other.project_name = " Plant A ".into();
        assert_eq!(
            payload().canonical_key().unwrap(),
            other.canonical_key().unwrap()
        );
    }

    #[test]
    fn test_key_changes_with_inputs() {
        let mut other = payload();
        other.npv = dec!(1);
        assert_ne!(
            payload().canonical_key().unwrap(),
            other.canonical_key().unwrap()
        );
    }
}
