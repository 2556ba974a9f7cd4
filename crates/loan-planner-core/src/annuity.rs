use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Loan, LoanSummary, Money, Months, Percent};

/// Below this monthly rate the closed form is replaced by straight-line
/// repayment.
const RATE_EPSILON: Decimal = dec!(0.000000000001);

/// Monthly periodic rate for an annual percentage rate.
pub fn monthly_rate(apr: Percent) -> Decimal {
    apr / dec!(100) / dec!(12)
}

/// Level monthly payment that amortises `principal` over `periods` months.
///
/// Never fails: non-positive principal or zero periods yield `0`, so partially
/// filled inputs can be priced without special casing. If `(1+r)^n` leaves the
/// Decimal range the payment converges to interest-only, `principal * r`.
pub fn compute_annuity_payment(principal: Money, apr: Percent, periods: Months) -> Money {
    if principal <= Decimal::ZERO || periods == 0 {
        return Decimal::ZERO;
    }

    let r = monthly_rate(apr);
    let n = Decimal::from(periods);
    if r.abs() < RATE_EPSILON {
        return principal / n;
    }

    // P * r * f / (f - 1) rewritten as P * r / (1 - 1/f) to keep the
    // intermediate product inside the Decimal range.
    let factor = match (Decimal::ONE + r).checked_powi(periods as i64) {
        Some(f) => f,
        None => return principal * r,
    };
    let discount = match Decimal::ONE.checked_div(factor) {
        Some(d) => d,
        None => return Decimal::ZERO,
    };
    let denom = Decimal::ONE - discount;
    if denom.is_zero() {
        return principal / n;
    }

    principal * r / denom
}

/// Payment, total paid and total interest of a loan under its regular
/// schedule, without materialising the rows.
///
/// A loan with no schedule (no positive principal or no term) reports zero
/// across the board rather than a negative interest figure.
pub fn summarize_loan(loan: &Loan) -> LoanSummary {
    let monthly_payment = compute_annuity_payment(loan.principal, loan.apr, loan.months);
    if monthly_payment.is_zero() {
        return LoanSummary {
            monthly_payment,
            total_paid: Decimal::ZERO,
            total_interest: Decimal::ZERO,
        };
    }
    let total_paid = monthly_payment * Decimal::from(loan.months);
    let total_interest = total_paid - loan.principal;

    LoanSummary {
        monthly_payment,
        total_paid,
        total_interest,
    }
}

/// Outstanding balance after `periods_elapsed` regular payments.
///
/// Uses `P * ((1+r)^n - (1+r)^k) / ((1+r)^n - 1)`, falling back to
/// `P * (n - k) / n` at zero rate. Returns `0` once the term has run out.
pub fn remaining_balance(loan: &Loan, periods_elapsed: Months) -> Money {
    if periods_elapsed >= loan.months || loan.principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let r = monthly_rate(loan.apr);
    if r.abs() < RATE_EPSILON {
        let n = Decimal::from(loan.months);
        let k = Decimal::from(periods_elapsed);
        return loan.principal * (n - k) / n;
    }

    let one_plus_r = Decimal::ONE + r;
    let (factor_n, factor_k) = match (
        one_plus_r.checked_powi(loan.months as i64),
        one_plus_r.checked_powi(periods_elapsed as i64),
    ) {
        (Some(n), Some(k)) => (n, k),
        // Payments are all interest at this scale; the balance barely moves.
        _ => return loan.principal,
    };

    let denom = factor_n - Decimal::ONE;
    if denom.is_zero() {
        return Decimal::ZERO;
    }
    loan.principal * ((factor_n - factor_k) / denom)
}

/// Aggregate figures for a set of loans repaid side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    /// Payment-weighted average term in months. This is a rough "time to
    /// freedom" figure, not the date the last loan is retired.
    pub weighted_end_time: Months,
}

/// Sum the regular-schedule figures of every loan and compute the
/// payment-weighted end time. Falls back to the longest term when nothing
/// is being paid.
pub fn summarize_portfolio(loans: &[Loan]) -> PortfolioSummary {
    let mut total_monthly_payment = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut weighted_months = Decimal::ZERO;

    for loan in loans {
        let summary = summarize_loan(loan);
        total_monthly_payment += summary.monthly_payment;
        total_paid += summary.total_paid;
        total_interest += summary.total_interest;
        weighted_months += Decimal::from(loan.months) * summary.monthly_payment;
    }

    let weighted_end_time = if total_monthly_payment.is_zero() {
        loans.iter().map(|l| l.months).max().unwrap_or(0)
    } else {
        (weighted_months / total_monthly_payment)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    };

    PortfolioSummary {
        total_monthly_payment,
        total_paid,
        total_interest,
        weighted_end_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(principal: Money, apr: Percent, months: Months) -> Loan {
        Loan::new("l", "Loan", principal, apr, months)
    }

    #[test]
    fn test_payment_twelve_percent_one_year() {
        let pmt = compute_annuity_payment(dec!(100_000), dec!(12), 12);
        // 100k * 0.01 / (1 - 1.01^-12) ≈ 8884.88
        assert!((pmt - dec!(8884.88)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_zero_rate_is_exactly_linear() {
        for (p, n) in [(dec!(100_000), 12u32), (dec!(1), 7), (dec!(12_345.67), 360)] {
            assert_eq!(compute_annuity_payment(p, Decimal::ZERO, n), p / Decimal::from(n));
        }
    }

    #[test]
    fn test_near_zero_rate_converges_to_linear() {
        let linear = dec!(120_000) / dec!(60);
        let mut previous_gap = Decimal::MAX;
        for apr in [dec!(0.1), dec!(0.01), dec!(0.001), dec!(0.0001)] {
            let gap = (compute_annuity_payment(dec!(120_000), apr, 60) - linear).abs();
            assert!(gap < previous_gap);
            previous_gap = gap;
        }
        assert!(previous_gap < dec!(0.01));
    }

    #[test]
    fn test_sub_epsilon_rate_uses_linear_branch() {
        // apr / 1200 is below the 1e-12 threshold
        let pmt = compute_annuity_payment(dec!(1_000), dec!(0.000000001), 10);
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_invalid_inputs_yield_zero() {
        assert_eq!(compute_annuity_payment(Decimal::ZERO, dec!(12), 12), Decimal::ZERO);
        assert_eq!(compute_annuity_payment(dec!(1_000), dec!(12), 0), Decimal::ZERO);
        assert_eq!(compute_annuity_payment(dec!(-1_000), dec!(12), 12), Decimal::ZERO);
        assert_eq!(compute_annuity_payment(dec!(-1_000), Decimal::ZERO, 0), Decimal::ZERO);
    }

    #[test]
    fn test_extreme_rate_falls_back_to_interest_only() {
        // 1.25^3600 is far beyond the Decimal range
        let pmt = compute_annuity_payment(dec!(1_000), dec!(300), 3600);
        assert_eq!(pmt, dec!(1_000) * monthly_rate(dec!(300)));
    }

    #[test]
    fn test_summarize_loan_totals() {
        let s = summarize_loan(&loan(dec!(100_000), dec!(12), 12));
        assert_eq!(s.total_paid, s.monthly_payment * dec!(12));
        assert_eq!(s.total_interest, s.total_paid - dec!(100_000));
        assert!(s.total_interest > dec!(6_600) && s.total_interest < dec!(6_700));
    }

    #[test]
    fn test_summarize_closed_loan_is_zero() {
        let s = summarize_loan(&loan(Decimal::ZERO, dec!(12), 12));
        assert_eq!(s.monthly_payment, Decimal::ZERO);
        assert_eq!(s.total_paid, Decimal::ZERO);
        assert_eq!(s.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_summarize_termless_loan_has_no_negative_interest() {
        let s = summarize_loan(&loan(dec!(10_000), dec!(9), 0));
        assert_eq!(s.monthly_payment, Decimal::ZERO);
        assert_eq!(s.total_paid, Decimal::ZERO);
        assert_eq!(s.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_endpoints() {
        let l = loan(dec!(50_000), dec!(9), 36);
        assert!((remaining_balance(&l, 0) - dec!(50_000)).abs() < dec!(0.0001));
        assert_eq!(remaining_balance(&l, 36), Decimal::ZERO);
        assert_eq!(remaining_balance(&l, 40), Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_zero_rate_linear() {
        let l = loan(dec!(1_200), Decimal::ZERO, 12);
        assert_eq!(remaining_balance(&l, 3), dec!(900));
    }

    #[test]
    fn test_remaining_balance_decreases() {
        let l = loan(dec!(100_000), dec!(12), 12);
        let mut last = l.principal;
        for k in 1..12 {
            let b = remaining_balance(&l, k);
            assert!(b < last);
            last = b;
        }
        // one payment left: balance * 1.01 == payment
        let pmt = compute_annuity_payment(l.principal, l.apr, l.months);
        assert!((last * dec!(1.01) - pmt).abs() < dec!(0.01));
    }

    #[test]
    fn test_portfolio_weighted_end_time() {
        // Equal payments at 12 and 24 months average to 18.
        let a = loan(dec!(1_200), Decimal::ZERO, 12); // 100/month
        let b = loan(dec!(2_400), Decimal::ZERO, 24); // 100/month
        let summary = summarize_portfolio(&[a, b]);
        assert_eq!(summary.total_monthly_payment, dec!(200));
        assert_eq!(summary.total_paid, dec!(3_600));
        assert_eq!(summary.total_interest, Decimal::ZERO);
        assert_eq!(summary.weighted_end_time, 18);
    }

    #[test]
    fn test_portfolio_weighted_end_time_rounds_half_up() {
        // (12 * 100 + 13 * 100) / 200 = 12.5 -> 13
        let a = loan(dec!(1_200), Decimal::ZERO, 12);
        let b = loan(dec!(1_300), Decimal::ZERO, 13);
        assert_eq!(summarize_portfolio(&[a, b]).weighted_end_time, 13);
    }

    #[test]
    fn test_portfolio_without_payments_uses_longest_term() {
        let a = loan(Decimal::ZERO, dec!(5), 12);
        let b = loan(Decimal::ZERO, dec!(5), 48);
        assert_eq!(summarize_portfolio(&[a, b]).weighted_end_time, 48);
        assert_eq!(summarize_portfolio(&[]).weighted_end_time, 0);
    }
}
