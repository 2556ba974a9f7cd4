use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::schedule::{build_amortization_schedule, ScheduleParams};
use crate::error::LoanPlannerError;
use crate::types::*;
use crate::LoanPlannerResult;

/// Effect of a prepayment relative to the untouched schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentImpact {
    pub amount_applied: Money,
    pub baseline_total_interest: Money,
    pub total_interest: Money,
    pub interest_saved: Money,
    pub payment_before: Money,
    /// Regular payment after the event; zero if the prepayment retired the loan.
    pub payment_after: Money,
    pub baseline_months: Months,
    pub actual_months: Months,
}

/// Compare the schedule with its prepayment against the same loan without it.
pub fn analyze_prepayment(params: &ScheduleParams) -> LoanPlannerResult<PrepaymentImpact> {
    if params.prepayment.is_none() {
        return Err(LoanPlannerError::InvalidInput {
            field: "prepayment".into(),
            reason: "A prepayment is required to measure its impact.".into(),
        });
    }

    let baseline = build_amortization_schedule(&ScheduleParams {
        prepayment: None,
        ..params.clone()
    })?;
    let with_prepayment = build_amortization_schedule(params)?;

    let requested = params.prepayment.map(|p| p.amount).unwrap_or(Decimal::ZERO);
    let (amount_applied, payment_after) = match with_prepayment
        .rows
        .iter()
        .position(|r| r.is_prepayment)
    {
        Some(idx) => (
            requested.min(with_prepayment.rows[idx].balance_start),
            with_prepayment
                .rows
                .get(idx + 1)
                .map(|r| r.payment)
                .unwrap_or(Decimal::ZERO),
        ),
        None => (Decimal::ZERO, baseline.initial_payment),
    };

    Ok(PrepaymentImpact {
        amount_applied,
        baseline_total_interest: baseline.total_interest,
        total_interest: with_prepayment.total_interest,
        interest_saved: baseline.total_interest - with_prepayment.total_interest,
        payment_before: baseline.initial_payment,
        payment_after,
        baseline_months: baseline.actual_months,
        actual_months: with_prepayment.actual_months,
    })
}
