use serde::{Deserialize, Serialize};

use super::payload::NarrativePayload;
use crate::valuation::decision::{investment_verdict, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarrativeSource {
    Service,
    Cache,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub verdict: Verdict,
    pub headline: String,
    pub commentary: String,
    pub source: NarrativeSource,
}

fn percent(rate: rust_decimal::Decimal) -> String {
    format!("{:.2}%", rate * rust_decimal::Decimal::ONE_HUNDRED)
}

/// One-line summary of a verdict, shared by every narrative source.
pub fn headline(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Accept => "Accept: the project creates value",
        Verdict::NeedsOptimization => "Needs optimization: value creation is marginal",
        Verdict::Reject => "Reject: the project destroys value",
    }
}

/// Deterministic commentary built only from the payload figures.
pub fn fallback_narrative(payload: &NarrativePayload) -> Narrative {
    let verdict = investment_verdict(payload.npv, payload.irr, payload.discount_rate);

    let irr_text = match payload.irr {
        Some(r) => format!("an IRR of {}", percent(r)),
        None => "no computable IRR".to_string(),
    };
    let facts = format!(
        "{} requires an investment of {} and shows an NPV of {} at a {} discount rate, with {}.",
        payload.project_name,
        payload.initial_investment.round_dp(0),
        payload.npv.round_dp(0),
        percent(payload.discount_rate),
        irr_text
    );

    let advice = match verdict {
        Verdict::Accept => {
            "Returns exceed the cost of capital; proceed while monitoring \
             the key revenue and cost drivers."
        }
        Verdict::NeedsOptimization => {
            "NPV and IRR disagree; revisit scope, phasing or cost assumptions \
             before committing capital."
        }
        Verdict::Reject => {
            "Returns fall short of the cost of capital; the project should \
             not proceed in its current form."
        }
    };

    Narrative {
        verdict,
        headline: headline(verdict).to_string(),
        commentary: format!("{facts} {advice}"),
        source: NarrativeSource::Fallback,
    }
}
