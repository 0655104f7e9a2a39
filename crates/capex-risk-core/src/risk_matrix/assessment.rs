//! Qualitative probability × impact risk matrix.
//!
//! Ratings are 1..5 each; a score is their product (1..25). Levels use
//! fixed thresholds: `≤ 6` Low, `≤ 14` Medium, otherwise High.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput};
use crate::CapexRiskResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const LOW_CEILING: Decimal = dec!(6);
const MEDIUM_CEILING: Decimal = dec!(14);
const MIN_RATING: u8 = 1;
const MAX_RATING: u8 = 5;
pub const DEFAULT_TOP_K: usize = 2;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// A named risk with qualitative ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskItem {
    pub name: String,
    /// Likelihood rating 1 (rare) .. 5 (almost certain).
    pub probability: u8,
    /// Consequence rating 1 (negligible) .. 5 (severe).
    pub impact: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: Decimal) -> Self {
        if score <= LOW_CEILING {
            RiskLevel::Low
        } else if score <= MEDIUM_CEILING {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemScore {
    pub name: String,
    pub probability: u8,
    pub impact: u8,
    pub score: u8,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRisk {
    /// Mean of item scores.
    pub score: Decimal,
    pub level: RiskLevel,
}

/// 3×3 grid indexed `[probability_bucket][impact_bucket]`, each cell
/// holding item names in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMatrix {
    pub cells: [[Vec<String>; 3]; 3],
}

impl RiskMatrix {
    /// Names in one cell; `None` when either bucket is outside `0..3`.
    pub fn cell(&self, probability_bucket: usize, impact_bucket: usize) -> Option<&[String]> {
        self.cells
            .get(probability_bucket)?
            .get(impact_bucket)
            .map(Vec::as_slice)
    }

    pub fn total_items(&self) -> usize {
        self.cells.iter().flatten().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mitigation {
    pub rank: usize,
    pub name: String,
    pub score: u8,
    pub level: RiskLevel,
    pub suggestions: Vec<String>,
}

/// Input for a full project risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessmentInput {
    pub items: Vec<RiskItem>,
    /// How many of the highest-scoring risks get mitigation suggestions.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessmentOutput {
    pub items: Vec<ItemScore>,
    /// `None` when there are no items to aggregate.
    pub project_risk: Option<ProjectRisk>,
    pub matrix: RiskMatrix,
    pub mitigations: Vec<Mitigation>,
}

// ---------------------------------------------------------------------------
// Mitigation lookup
// ---------------------------------------------------------------------------

fn mitigation_suggestions(name: &str) -> &'static [&'static str] {
    match name.trim().to_lowercase().as_str() {
        "market demand" | "demand" | "market" => &[
            "Secure offtake or pre-sale agreements before final investment decision",
            "Phase capacity additions against observed demand",
        ],
        "cost overrun" | "capex overrun" | "cost" => &[
            "Fix major packages under lump-sum EPC contracts",
            "Hold a contingency reserve sized from the P90 estimate",
        ],
        "construction delay" | "delay" | "schedule" => &[
            "Add liquidated damages for late completion",
            "Track critical path weekly with float reporting",
        ],
        "regulatory" | "regulatory approval" | "permitting" => &[
            "Engage regulators early and sequence permits on the critical path",
            "Make financial close conditional on key approvals",
        ],
        "financing" | "interest rate" | "funding" => &[
            "Lock in rates with swaps or fixed-rate tranches",
            "Diversify lenders and keep committed standby facilities",
        ],
        "technology" | "technical" => &[
            "Require performance guarantees from technology vendors",
            "Run a pilot before full-scale deployment",
        ],
        "supply chain" | "supplier" | "procurement" => &[
            "Qualify second-source suppliers for critical items",
            "Pre-order long-lead equipment",
        ],
        "exchange rate" | "currency" | "fx" => &[
            "Match revenue and cost currencies where possible",
            "Hedge committed foreign-currency payments with forwards",
        ],
        _ => &[
            "Assign a risk owner and review the rating monthly",
            "Define trigger events and a contingency response",
        ],
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

fn clamp_rating(rating: u8) -> u8 {
    rating.clamp(MIN_RATING, MAX_RATING)
}

/// Score and level for one item. Ratings outside 1..5 are clamped first.
pub fn score_item(item: &RiskItem) -> (u8, RiskLevel) {
    let score = clamp_rating(item.probability) * clamp_rating(item.impact);
    (score, RiskLevel::from_score(Decimal::from(score)))
}

/// Mean item score with its level; `None` for an empty list.
pub fn aggregate(items: &[RiskItem]) -> Option<ProjectRisk> {
    if items.is_empty() {
        return None;
    }
    let total: u32 = items.iter().map(|i| u32::from(score_item(i).0)).sum();
    let score = Decimal::from(total) / Decimal::from(items.len() as u64);
    Some(ProjectRisk {
        score,
        level: RiskLevel::from_score(score),
    })
}

/// `1..2 → 0`, `3 → 1`, `4..5 → 2`.
pub fn bucket(rating: u8) -> usize {
    match clamp_rating(rating) {
        1 | 2 => 0,
        3 => 1,
        _ => 2,
    }
}

/// Place every item in exactly one cell of the 3×3 matrix.
pub fn build_matrix(items: &[RiskItem]) -> RiskMatrix {
    let mut matrix = RiskMatrix::default();
    for item in items {
        matrix.cells[bucket(item.probability)][bucket(item.impact)].push(item.name.clone());
    }
    matrix
}

/// Highest scores first, ties kept in input order, truncated to `top_k`.
pub fn rank_mitigations(items: &[RiskItem], top_k: usize) -> Vec<Mitigation> {
    let mut scored: Vec<(&RiskItem, u8, RiskLevel)> = items
        .iter()
        .map(|item| {
            let (score, level) = score_item(item);
            (item, score, level)
        })
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, (item, score, level))| Mitigation {
            rank: i + 1,
            name: item.name.clone(),
            score,
            level,
            suggestions: mitigation_suggestions(&item.name)
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Main function
// ---------------------------------------------------------------------------

/// Score, aggregate, bucket and rank a project's qualitative risks.
pub fn assess_project_risks(
    input: &RiskAssessmentInput,
) -> CapexRiskResult<ComputationOutput<RiskAssessmentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for item in &input.items {
        for (label, rating) in [("probability", item.probability), ("impact", item.impact)] {
            if rating != clamp_rating(rating) {
                warnings.push(format!(
                    "{} {label} rating {rating} clamped to {}",
                    item.name,
                    clamp_rating(rating)
                ));
            }
        }
    }
    if input.items.is_empty() {
        warnings.push("No risk items supplied; project risk not assessed".into());
    }

    let items = input
        .items
        .iter()
        .map(|item| {
            let (score, level) = score_item(item);
            ItemScore {
                name: item.name.clone(),
                probability: clamp_rating(item.probability),
                impact: clamp_rating(item.impact),
                score,
                level,
            }
        })
        .collect();

    let output = RiskAssessmentOutput {
        items,
        project_risk: aggregate(&input.items),
        matrix: build_matrix(&input.items),
        mitigations: rank_mitigations(&input.items, input.top_k),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Probability x Impact Risk Matrix",
        &serde_json::json!({
            "item_count": input.items.len(),
            "top_k": input.top_k,
            "thresholds": { "low_max": LOW_CEILING, "medium_max": MEDIUM_CEILING },
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
