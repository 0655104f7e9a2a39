use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Accept/reject call derived only from NPV and IRR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// NPV > 0 and IRR above the discount rate.
    Accept,
    /// Exactly one of the two tests passes.
    NeedsOptimization,
    /// Neither test passes.
    Reject,
}

/// A missing IRR never clears the hurdle.
pub fn investment_verdict(npv: Money, irr: Option<Rate>, discount_rate: Rate) -> Verdict {
    let npv_positive = npv > Money::ZERO;
    let irr_clears = irr.is_some_and(|r| r > discount_rate);
    match (npv_positive, irr_clears) {
        (true, true) => Verdict::Accept,
        (false, false) => Verdict::Reject,
        _ => Verdict::NeedsOptimization,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accept_when_both_pass() {
        assert_eq!(
            investment_verdict(dec!(10), Some(dec!(0.15)), dec!(0.10)),
            Verdict::Accept
        );
    }

    #[test]
    fn test_needs_optimization_when_one_passes() {
        assert_eq!(
            investment_verdict(dec!(10), None, dec!(0.10)),
            Verdict::NeedsOptimization
        );
        assert_eq!(
            investment_verdict(dec!(-1), Some(dec!(0.12)), dec!(0.10)),
            Verdict::NeedsOptimization
        );
    }

    #[test]
    fn test_reject_when_neither_passes() {
        assert_eq!(
            investment_verdict(dec!(-616000000), Some(dec!(-0.7125)), dec!(0.25)),
            Verdict::Reject
        );
        assert_eq!(investment_verdict(dec!(0), None, dec!(0.10)), Verdict::Reject);
    }
}
