use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::*;

/// Result of spreading a lump sum over existing loans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashAllocation {
    /// Loans still outstanding, reduced where cash reached them. Fully
    /// retired loans are absent.
    pub loans: Vec<Loan>,
    /// Cash not needed to retire debt.
    pub cash_left: Money,
    /// Amount applied per loan id.
    pub allocation: BTreeMap<String, Money>,
}

/// Apply `cash` to `loans` highest APR first (avalanche).
///
/// Greedy and single pass: each loan is either retired (and dropped from the
/// output), partially paid down, or left untouched once the cash runs out.
/// Survivors keep their input order. Non-positive cash leaves everything as
/// is with nothing left over.
pub fn allocate_cash_avalanche(loans: &[Loan], cash: Money) -> CashAllocation {
    if cash <= Decimal::ZERO {
        return CashAllocation {
            loans: loans.to_vec(),
            cash_left: Decimal::ZERO,
            allocation: BTreeMap::new(),
        };
    }

    // Stable sort: equal rates keep their input order.
    let mut by_rate: Vec<usize> = (0..loans.len()).collect();
    by_rate.sort_by(|&a, &b| loans[b].apr.cmp(&loans[a].apr));

    let mut remaining = cash;
    let mut allocation = BTreeMap::new();
    let mut outcome: Vec<Option<Loan>> = loans.iter().cloned().map(Some).collect();

    for idx in by_rate {
        if remaining <= Decimal::ZERO {
            break;
        }
        let loan = &loans[idx];
        // A negative balance owes nothing and must not feed cash back in.
        let owed = loan.principal.max(Decimal::ZERO);
        if remaining >= owed {
            allocation.insert(loan.id.clone(), owed);
            remaining -= owed;
            outcome[idx] = None;
            tracing::debug!(loan = %loan.id, amount = %owed, "loan retired from cash");
        } else {
            allocation.insert(loan.id.clone(), remaining);
            outcome[idx] = Some(loan.with_principal(loan.principal - remaining));
            tracing::debug!(loan = %loan.id, amount = %remaining, "loan paid down from cash");
            remaining = Decimal::ZERO;
        }
    }

    CashAllocation {
        loans: outcome.into_iter().flatten().collect(),
        cash_left: remaining,
        allocation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn loan(id: &str, apr: Percent, principal: Money) -> Loan {
        Loan::new(id, id, principal, apr, 36)
    }

    #[test]
    fn test_partial_paydown_of_highest_rate() {
        let loans = vec![loan("low", dec!(8), dec!(30_000)), loan("high", dec!(18), dec!(50_000))];
        let out = allocate_cash_avalanche(&loans, dec!(25_000));

        assert_eq!(out.allocation, BTreeMap::from([("high".to_string(), dec!(25_000))]));
        assert_eq!(out.cash_left, Decimal::ZERO);
        assert_eq!(out.loans.len(), 2);
        assert_eq!(out.loans[0], loans[0]);
        assert_eq!(out.loans[1].id, "high");
        assert_eq!(out.loans[1].principal, dec!(25_000));
    }

    #[test]
    fn test_excess_cash_retires_loan() {
        let loans = vec![loan("high", dec!(18), dec!(50_000))];
        let out = allocate_cash_avalanche(&loans, dec!(60_000));

        assert_eq!(out.allocation["high"], dec!(50_000));
        assert_eq!(out.cash_left, dec!(10_000));
        assert!(out.loans.is_empty());
    }

    #[test]
    fn test_cash_rolls_down_the_rate_ladder() {
        let loans = vec![
            loan("mid", dec!(12), dec!(10_000)),
            loan("top", dec!(24), dec!(5_000)),
            loan("bottom", dec!(4), dec!(20_000)),
        ];
        let out = allocate_cash_avalanche(&loans, dec!(8_000));

        // top retired, mid reduced by the remaining 3k, bottom untouched
        assert_eq!(out.allocation.len(), 2);
        assert_eq!(out.allocation["top"], dec!(5_000));
        assert_eq!(out.allocation["mid"], dec!(3_000));
        let ids: Vec<&str> = out.loans.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["mid", "bottom"]);
        assert_eq!(out.loans[0].principal, dec!(7_000));
        assert_eq!(out.loans[1].principal, dec!(20_000));
    }

    #[test]
    fn test_exact_cash_retires_without_leftover() {
        let loans = vec![loan("a", dec!(10), dec!(1_000))];
        let out = allocate_cash_avalanche(&loans, dec!(1_000));
        assert!(out.loans.is_empty());
        assert_eq!(out.cash_left, Decimal::ZERO);
    }

    #[test]
    fn test_no_cash_changes_nothing() {
        let loans = vec![loan("a", dec!(10), dec!(1_000))];
        for cash in [Decimal::ZERO, dec!(-500)] {
            let out = allocate_cash_avalanche(&loans, cash);
            assert_eq!(out.loans, loans);
            assert!(out.allocation.is_empty());
            assert_eq!(out.cash_left, Decimal::ZERO);
        }
    }

    #[test]
    fn test_cash_with_no_loans_is_all_left() {
        let out = allocate_cash_avalanche(&[], dec!(750));
        assert!(out.loans.is_empty());
        assert_eq!(out.cash_left, dec!(750));
    }

    #[test]
    fn test_negative_principal_creates_no_cash() {
        let loans = vec![loan("credit", dec!(30), dec!(-2_000)), loan("card", dec!(20), dec!(1_500))];
        let out = allocate_cash_avalanche(&loans, dec!(1_000));

        assert_eq!(out.allocation["credit"], Decimal::ZERO);
        assert_eq!(out.allocation["card"], dec!(1_000));
        assert_eq!(out.cash_left, Decimal::ZERO);
        let ids: Vec<&str> = out.loans.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["card"]);
        assert_eq!(out.loans[0].principal, dec!(500));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let loans = vec![loan("a", dec!(10), dec!(1_000))];
        let _ = allocate_cash_avalanche(&loans, dec!(400));
        assert_eq!(loans[0].principal, dec!(1_000));
    }
}
