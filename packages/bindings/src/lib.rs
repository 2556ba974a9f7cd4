use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use loan_planner_core::Loan;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Annuity engine
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PaymentRequest {
    principal: Decimal,
    apr: Decimal,
    periods: u32,
}

/// Returns the payment as a decimal string, "0" for unusable input.
#[napi]
pub fn compute_annuity_payment(input_json: String) -> NapiResult<String> {
    let req: PaymentRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let payment =
        loan_planner_core::annuity::compute_annuity_payment(req.principal, req.apr, req.periods);
    Ok(payment.to_string())
}

#[napi]
pub fn summarize_loan(input_json: String) -> NapiResult<String> {
    let loan: Loan = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let summary = loan_planner_core::annuity::summarize_loan(&loan);
    serde_json::to_string(&summary).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct BalanceRequest {
    loan: Loan,
    periods_elapsed: u32,
}

#[napi]
pub fn remaining_balance(input_json: String) -> NapiResult<String> {
    let req: BalanceRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let balance = loan_planner_core::annuity::remaining_balance(&req.loan, req.periods_elapsed);
    Ok(balance.to_string())
}

#[napi]
pub fn build_amortization_schedule(input_json: String) -> NapiResult<String> {
    let params: loan_planner_core::amortization::schedule::ScheduleParams =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_planner_core::amortization::schedule::schedule_report(&params)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_prepayment(input_json: String) -> NapiResult<String> {
    let params: loan_planner_core::amortization::schedule::ScheduleParams =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_planner_core::amortization::prepayment::analyze_prepayment(&params)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Allocation and planning
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AllocationRequest {
    loans: Vec<Loan>,
    cash: Decimal,
}

#[napi]
pub fn allocate_cash_avalanche(input_json: String) -> NapiResult<String> {
    let req: AllocationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_planner_core::allocation::avalanche::allocate_cash_avalanche(&req.loans, req.cash);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn evaluate_scenarios(input_json: String) -> NapiResult<String> {
    let input: loan_planner_core::optimizer::plan::OptimizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_planner_core::optimizer::plan::evaluate_scenarios(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn find_best_plan(input_json: String) -> NapiResult<String> {
    let input: loan_planner_core::optimizer::plan::OptimizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_planner_core::optimizer::plan::optimize_plan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
