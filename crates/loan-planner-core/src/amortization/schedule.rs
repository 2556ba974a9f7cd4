use chrono::{Months as CalendarMonths, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::annuity::{compute_annuity_payment, monthly_rate};
use crate::error::LoanPlannerError;
use crate::types::*;
use crate::LoanPlannerResult;

/// A remaining balance at or below this is treated as retired.
pub const BALANCE_EPSILON: Money = dec!(0.01);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// What happens to the schedule after an extra principal payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepaymentMode {
    /// Keep the term, recompute a smaller payment for the remaining periods.
    #[default]
    Reduce,
    /// Keep the payment, retire the loan early. Not implemented.
    Shorten,
}

impl std::fmt::Display for PrepaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrepaymentMode::Reduce => write!(f, "reduce"),
            PrepaymentMode::Shorten => write!(f, "shorten"),
        }
    }
}

/// A one-time extra principal payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prepayment {
    pub amount: Money,
    /// 1-based period in which the payment is made.
    pub at_period: Months,
    #[serde(default)]
    pub mode: PrepaymentMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub principal: Money,
    pub apr: Percent,
    pub periods: Months,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepayment: Option<Prepayment>,
    /// Date of the first regular payment; later rows follow monthly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

impl ScheduleParams {
    pub fn new(principal: Money, apr: Percent, periods: Months) -> Self {
        Self {
            principal,
            apr,
            periods,
            prepayment: None,
            first_payment_date: None,
        }
    }

    pub fn with_prepayment(mut self, prepayment: Prepayment) -> Self {
        self.prepayment = Some(prepayment);
        self
    }
}

/// One period of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: Months,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub balance_start: Money,
    pub payment: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub balance_end: Money,
    /// True for the row that carries the one-time prepayment.
    pub is_prepayment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub rows: Vec<AmortizationRow>,
    pub total_interest: Money,
    pub total_paid: Money,
    pub initial_payment: Money,
    pub actual_months: Months,
}

impl AmortizationSchedule {
    fn empty() -> Self {
        Self {
            rows: Vec::new(),
            total_interest: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            initial_payment: Decimal::ZERO,
            actual_months: 0,
        }
    }

    /// The row carrying the prepayment, if one was applied.
    pub fn prepayment_row(&self) -> Option<&AmortizationRow> {
        self.rows.iter().find(|r| r.is_prepayment)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate the loan month by month, applying at most one prepayment.
///
/// The prepayment occupies its own period: no interest accrues in that row
/// and the ongoing payment is re-annuitised over the periods that remain.
/// A prepayment in the final period also settles the residual balance and
/// its interest in that row.
/// Non-positive principal or zero periods give an empty schedule.
pub fn build_amortization_schedule(
    params: &ScheduleParams,
) -> LoanPlannerResult<AmortizationSchedule> {
    if let Some(pre) = &params.prepayment {
        if pre.mode == PrepaymentMode::Shorten {
            return Err(LoanPlannerError::UnsupportedPrepaymentMode {
                mode: pre.mode.to_string(),
            });
        }
    }

    if params.principal <= Decimal::ZERO || params.periods == 0 {
        return Ok(AmortizationSchedule::empty());
    }

    let r = monthly_rate(params.apr);
    let initial_payment = compute_annuity_payment(params.principal, params.apr, params.periods);
    let prepayment = params
        .prepayment
        .filter(|p| p.amount > Decimal::ZERO && p.at_period > 0);

    let mut payment = initial_payment;
    let mut balance = params.principal;
    let mut rows = Vec::with_capacity(params.periods as usize);

    for period in 1..=params.periods {
        if balance <= BALANCE_EPSILON {
            break;
        }
        let balance_start = balance;
        let payment_date = params
            .first_payment_date
            .and_then(|d| d.checked_add_months(CalendarMonths::new(period - 1)));

        if let Some(pre) = prepayment.filter(|p| p.at_period == period) {
            let applied = pre.amount.min(balance);
            balance -= applied;
            let remaining_periods = params.periods - period;

            // Final period: nothing is left to re-annuitise over, so the
            // residual is settled with its interest in the same row.
            let (paid, interest_portion) = if remaining_periods == 0 && balance > BALANCE_EPSILON
            {
                let interest = balance * r;
                let settled = applied + balance + interest;
                balance = Decimal::ZERO;
                (settled, interest)
            } else {
                (applied, Decimal::ZERO)
            };

            rows.push(AmortizationRow {
                period,
                payment_date,
                balance_start,
                payment: paid,
                interest_portion,
                principal_portion: balance_start - balance,
                balance_end: balance,
                is_prepayment: true,
            });

            if balance > BALANCE_EPSILON {
                payment = compute_annuity_payment(balance, params.apr, remaining_periods);
            }
            tracing::debug!(
                period,
                applied = %applied,
                new_payment = %payment,
                "prepayment applied"
            );
            continue;
        }

        let interest_portion = balance * r;
        let mut principal_portion = payment - interest_portion;
        let mut paid = payment;
        if principal_portion > balance {
            principal_portion = balance;
            paid = interest_portion + principal_portion;
        }
        balance -= principal_portion;

        rows.push(AmortizationRow {
            period,
            payment_date,
            balance_start,
            payment: paid,
            interest_portion,
            principal_portion,
            balance_end: balance,
            is_prepayment: false,
        });
    }

    let total_paid: Money = rows.iter().map(|r| r.payment).sum();
    let actual_months = rows.len() as Months;

    Ok(AmortizationSchedule {
        rows,
        total_interest: total_paid - params.principal,
        total_paid,
        initial_payment,
        actual_months,
    })
}

/// Build the schedule wrapped in the standard output envelope, with
/// warnings for inputs that were normalised rather than rejected.
pub fn schedule_report(
    params: &ScheduleParams,
) -> LoanPlannerResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = build_amortization_schedule(params)?;

    if schedule.rows.is_empty() {
        warnings.push(
            "Principal is not positive or the term is zero; the schedule is empty.".into(),
        );
    }
    if let Some(pre) = &params.prepayment {
        match schedule.prepayment_row() {
            None => warnings.push(format!(
                "Prepayment at period {} was not applied; the loan has no such period.",
                pre.at_period
            )),
            Some(row) if row.balance_start < pre.amount => warnings.push(format!(
                "Prepayment capped at the outstanding balance of {}.",
                row.balance_start.round_dp(2)
            )),
            Some(row) if row.interest_portion > Decimal::ZERO => warnings.push(format!(
                "Prepayment falls in the final period; the remaining balance of {} is settled in the same row.",
                (row.balance_start - pre.amount).round_dp(2)
            )),
            Some(_) => {}
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_rate": monthly_rate(params.apr).to_string(),
        "balance_epsilon": BALANCE_EPSILON.to_string(),
        "prepayment_mode": params.prepayment.map(|p| p.mode.to_string()),
    });

    Ok(with_metadata(
        "Level-payment amortisation with one-time principal prepayment",
        &assumptions,
        warnings,
        elapsed,
        schedule,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
