use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::error::CapexRiskError;
use crate::types::{Money, Rate};
use crate::CapexRiskResult;

const IRR_STEP_TOLERANCE: Decimal = dec!(0.000000001);
const MAX_IRR_ITERATIONS: u32 = 80;
const IRR_FLOOR: Decimal = dec!(-0.99);
const IRR_CEILING: Decimal = dec!(100);

fn rate_domain_error(function: &str) -> CapexRiskError {
    CapexRiskError::DomainError {
        function: function.into(),
        reason: "Discount rate must be greater than -100%".into(),
    }
}

/// Net Present Value of a series of cash flows, `Σ C_t / (1+r)^t`.
///
/// Index 0 is undiscounted. Rates at or below -100% have no defined
/// discount factor and are rejected with `DomainError`.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> CapexRiskResult<Money> {
    if rate <= dec!(-1) {
        return Err(rate_domain_error("NPV"));
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE
        .checked_add(rate)
        .ok_or_else(|| rate_domain_error("NPV"))?;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                CapexRiskError::DomainError {
                    function: "NPV".into(),
                    reason: format!("Discount factor overflow at period {t}"),
                }
            })?;
        }
        if discount.is_zero() {
            return Err(CapexRiskError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result = cf
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| CapexRiskError::DomainError {
                function: "NPV".into(),
                reason: format!("Present value overflow at period {t}"),
            })?;
    }

    Ok(result)
}

/// Floating-point twin of [`npv`] used on the simulation hot path.
/// Applies the same domain policy (NaN rates are rejected too).
pub fn npv_f64(rate: f64, cash_flows: &[f64]) -> CapexRiskResult<f64> {
    if rate.is_nan() || rate <= -1.0 {
        return Err(rate_domain_error("NPV"));
    }

    let one_plus_r = 1.0 + rate;
    let mut discount = 1.0_f64;
    let mut result = 0.0_f64;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Present value and its derivative with respect to the rate.
/// `None` when any intermediate leaves the representable range.
fn npv_and_slope(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut slope = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        value = value.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let next_discount = discount.checked_mul(one_plus_r)?;
            let term = Decimal::from(t as u64)
                .checked_mul(*cf)?
                .checked_div(next_discount)?;
            slope = slope.checked_sub(term)?;
        }
    }

    Some((value, slope))
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Stops once a step is smaller than 1e-9. Iterates are held inside
/// [-99%, 10 000%] so an overshooting step cannot cross the -100%
/// singularity. Series with no sign change, or several, routinely fail with
/// `ConvergenceFailure`; callers treat that as "IRR not available" rather
/// than a fault.
pub fn irr(cash_flows: &[Money], guess: Rate) -> CapexRiskResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(CapexRiskError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let diverged = |iterations: u32, last_delta: Decimal| {
        warn!(iterations, "IRR iterate left the valid domain");
        CapexRiskError::ConvergenceFailure {
            function: "IRR".into(),
            iterations,
            last_delta,
        }
    };

    let mut rate = guess;
    let mut last_delta = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        let (value, slope) =
            npv_and_slope(rate, cash_flows).ok_or_else(|| diverged(i, last_delta))?;

        if slope.is_zero() {
            return Err(diverged(i, value));
        }

        let step = value.checked_div(slope).ok_or_else(|| diverged(i, value))?;
        rate = rate.checked_sub(step).ok_or_else(|| diverged(i, value))?;
        last_delta = step;

        if step.abs() < IRR_STEP_TOLERANCE {
            return Ok(rate);
        }

        // Guard against divergence
        if rate < IRR_FLOOR {
            rate = IRR_FLOOR;
        } else if rate > IRR_CEILING {
            rate = IRR_CEILING;
        }
    }

    warn!(iterations = MAX_IRR_ITERATIONS, "IRR did not converge");
    Err(CapexRiskError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta,
    })
}

/// Fisher conversion: `(1 + nominal) / (1 + inflation) - 1`.
///
/// Inflation of exactly -100% is rejected with `DomainError`.
pub fn real_rate_from_nominal(nominal: Rate, inflation: Rate) -> CapexRiskResult<Rate> {
    let overflow = || CapexRiskError::DomainError {
        function: "real_rate_from_nominal".into(),
        reason: "Real rate overflows".into(),
    };
    let denominator = Decimal::ONE.checked_add(inflation).ok_or_else(overflow)?;
    if denominator.is_zero() {
        return Err(CapexRiskError::DomainError {
            function: "real_rate_from_nominal".into(),
            reason: "Inflation of -100% has no real-rate equivalent".into(),
        });
    }
    Decimal::ONE
        .checked_add(nominal)
        .and_then(|growth| growth.checked_div(denominator))
        .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
        .ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_single_year_project() {
        let cfs = vec![dec!(-800000000), dec!(230000000)];
        let result = npv(dec!(0.25), &cfs).unwrap();
        assert_eq!(result, dec!(-616000000));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let cfs = vec![dec!(-100), dec!(50)];
        assert!(matches!(
            npv(dec!(-1), &cfs),
            Err(CapexRiskError::DomainError { .. })
        ));
        assert!(npv(dec!(-1.5), &cfs).is_err());
    }

    #[test]
    fn test_npv_f64_matches_decimal() {
        let exact = npv(dec!(0.10), &[dec!(-1000), dec!(300), dec!(400), dec!(500)]).unwrap();
        let approx = npv_f64(0.10, &[-1000.0, 300.0, 400.0, 500.0]).unwrap();
        let exact_f64: f64 = exact.to_string().parse().unwrap();
        assert!((approx - exact_f64).abs() < 1e-9);
    }

    #[test]
    fn test_npv_f64_rejects_nan_and_singular_rates() {
        assert!(npv_f64(f64::NAN, &[1.0]).is_err());
        assert!(npv_f64(-1.0, &[1.0]).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.001));
    }

    #[test]
    fn test_irr_round_trip() {
        let cfs = vec![dec!(-500), dec!(120), dec!(180), dec!(260), dec!(90)];
        let r = irr(&cfs, dec!(0.10)).unwrap();
        let residual = npv(r, &cfs).unwrap();
        assert!(residual.abs() < dec!(0.000001), "residual={residual}");
    }

    #[test]
    fn test_irr_no_sign_change_fails() {
        let cfs = vec![dec!(100), dec!(100), dec!(100)];
        assert!(matches!(
            irr(&cfs, dec!(0.10)),
            Err(CapexRiskError::ConvergenceFailure { .. })
        ));
    }

    #[test]
    fn test_irr_needs_two_flows() {
        assert!(matches!(
            irr(&[dec!(-100)], dec!(0.10)),
            Err(CapexRiskError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_real_rate_fisher() {
        let r = real_rate_from_nominal(dec!(0.10), dec!(0.10)).unwrap();
        assert_eq!(r, Decimal::ZERO);
        let r = real_rate_from_nominal(dec!(0.155), dec!(0.05)).unwrap();
        assert_eq!(r, dec!(0.1));
    }

    #[test]
    fn test_real_rate_rejects_total_deflation() {
        assert!(real_rate_from_nominal(dec!(0.10), dec!(-1)).is_err());
    }

    #[test]
    fn test_real_rate_overflow_is_an_error() {
        let huge = Decimal::MAX / dec!(2);
        assert!(matches!(
            real_rate_from_nominal(huge, dec!(-0.9)),
            Err(CapexRiskError::DomainError { .. })
        ));
    }

    #[test]
    fn test_npv_overflowing_rate_is_an_error() {
        assert!(npv(Decimal::MAX, &[dec!(-1), dec!(1)]).is_err());
        assert!(npv(Decimal::MAX / dec!(2), &[dec!(-1), dec!(1), dec!(1)]).is_err());
    }
}
