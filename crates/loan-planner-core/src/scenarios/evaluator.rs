use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::allocation::avalanche::allocate_cash_avalanche;
use crate::annuity::{summarize_loan, summarize_portfolio};
use crate::types::*;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Restructuring strategy a scenario was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    /// Keep existing loans, pay them down avalanche-style with cash and
    /// borrow only what the upcoming expense still needs.
    NoConsolidation,
    /// Roll every existing balance plus the expense, net of cash, into one
    /// new loan.
    FullConsolidation,
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioKind::NoConsolidation => write!(f, "no consolidation"),
            ScenarioKind::FullConsolidation => write!(f, "full consolidation"),
        }
    }
}

/// One fully specified restructuring outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    /// Candidate term used for any new borrowing.
    pub term: Months,
    pub loans: Vec<Loan>,
    pub total_monthly_payment: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    /// Payment-weighted average term. An approximation, not a payoff date.
    pub weighted_end_time: Months,
    pub description: String,
    /// Cash applied per existing loan id, when any was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_allocation: Option<BTreeMap<String, Money>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Pay existing loans down with cash (highest APR first), then finance
/// whatever part of the upcoming expense the leftover cash does not cover.
///
/// Emits one scenario per candidate term. The cash step does not depend on
/// the term, so every scenario carries the same allocation.
pub fn evaluate_no_consolidation(
    existing_loans: &[Loan],
    cash_available: Money,
    upcoming_expense: Money,
    new_loan_apr: Percent,
    candidate_terms: &[Months],
) -> Vec<Scenario> {
    let paydown = allocate_cash_avalanche(existing_loans, cash_available);
    let need = (upcoming_expense - paydown.cash_left).max(Decimal::ZERO);
    let cash_allocation = if paydown.allocation.is_empty() {
        None
    } else {
        Some(paydown.allocation.clone())
    };

    tracing::debug!(
        survivors = paydown.loans.len(),
        cash_left = %paydown.cash_left,
        need = %need,
        "evaluating no-consolidation scenarios"
    );

    map_terms(candidate_terms, |term| {
        let mut loans = paydown.loans.clone();
        if need > Decimal::ZERO {
            loans.push(Loan::new(
                format!("new-{term}m"),
                "New loan",
                need,
                new_loan_apr,
                term,
            ));
        }
        let totals = summarize_portfolio(&loans);

        Scenario {
            kind: ScenarioKind::NoConsolidation,
            term,
            description: describe_no_consolidation(cash_allocation.is_some(), need, term),
            loans,
            total_monthly_payment: totals.total_monthly_payment,
            total_interest: totals.total_interest,
            total_paid: totals.total_paid,
            weighted_end_time: totals.weighted_end_time,
            cash_allocation: cash_allocation.clone(),
        }
    })
}

/// Replace every existing loan with one new loan covering all balances plus
/// the upcoming expense, net of available cash.
///
/// Returns nothing when cash already covers all of that.
pub fn evaluate_full_consolidation(
    existing_loans: &[Loan],
    cash_available: Money,
    upcoming_expense: Money,
    new_loan_apr: Percent,
    candidate_terms: &[Months],
) -> Vec<Scenario> {
    let outstanding: Money = existing_loans.iter().map(|l| l.principal).sum();
    let amount = outstanding + upcoming_expense - cash_available;
    if amount <= Decimal::ZERO {
        tracing::debug!(amount = %amount, "consolidation not needed");
        return Vec::new();
    }

    tracing::debug!(amount = %amount, "evaluating full-consolidation scenarios");

    map_terms(candidate_terms, |term| {
        let consolidated = Loan::new(
            format!("consolidated-{term}m"),
            "Consolidated loan",
            amount,
            new_loan_apr,
            term,
        );
        let summary = summarize_loan(&consolidated);

        Scenario {
            kind: ScenarioKind::FullConsolidation,
            term,
            loans: vec![consolidated],
            total_monthly_payment: summary.monthly_payment,
            total_interest: summary.total_interest,
            total_paid: summary.total_paid,
            weighted_end_time: term,
            description: format!(
                "Consolidate {} of debt into one {term}-month loan",
                amount.round_dp(2)
            ),
            cash_allocation: None,
        }
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Build one scenario per term, preserving term order.
fn map_terms<F>(terms: &[Months], build: F) -> Vec<Scenario>
where
    F: Fn(Months) -> Scenario + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        terms.par_iter().map(|&t| build(t)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        terms.iter().map(|&t| build(t)).collect()
    }
}

fn describe_no_consolidation(paid_down: bool, need: Money, term: Months) -> String {
    let lead = if paid_down {
        "Pay down existing loans with cash (highest rate first)"
    } else {
        "Keep existing loans"
    };
    if need > Decimal::ZERO {
        format!("{lead}, finance {} over {term} months", need.round_dp(2))
    } else {
        format!("{lead}, no new borrowing")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
