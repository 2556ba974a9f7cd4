use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use crate::error::LoanPlannerError;
use crate::scenarios::evaluator::{evaluate_full_consolidation, evaluate_no_consolidation, Scenario};
use crate::types::*;
use crate::LoanPlannerResult;

/// Number of lowest-payment scenarios kept when no scenario fits the budget.
const BUDGET_FALLBACK_POOL: usize = 3;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// What the optimizer minimises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    #[default]
    MinTotalInterest,
    MinMonthlyPayment,
}

impl Objective {
    fn headline(&self, scenario: &Scenario) -> Money {
        match self {
            Objective::MinTotalInterest => scenario.total_interest,
            Objective::MinMonthlyPayment => scenario.total_monthly_payment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationInput {
    pub existing_loans: Vec<Loan>,
    #[serde(default)]
    pub cash_available: Money,
    #[serde(default)]
    pub upcoming_expense: Money,
    /// Rate assumed for any new or consolidated borrowing.
    pub new_loan_apr: Percent,
    pub candidate_terms: Vec<Months>,
    #[serde(default)]
    pub objective: Objective,
    /// Ceiling on the combined monthly payment. Ignored unless positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_monthly: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best: Scenario,
    /// Every evaluated scenario, including those rejected by the budget.
    pub compared: Vec<Scenario>,
    pub reason: String,
    pub budget_exceeded: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate both restructuring strategies for every candidate term,
/// no-consolidation scenarios first.
///
/// A term of 0 months can never repay new borrowing, so it is skipped.
pub fn evaluate_scenarios(input: &OptimizationInput) -> Vec<Scenario> {
    let terms = usable_terms(&input.candidate_terms);
    let mut scenarios = evaluate_no_consolidation(
        &input.existing_loans,
        input.cash_available,
        input.upcoming_expense,
        input.new_loan_apr,
        &terms,
    );
    scenarios.extend(evaluate_full_consolidation(
        &input.existing_loans,
        input.cash_available,
        input.upcoming_expense,
        input.new_loan_apr,
        &terms,
    ));
    scenarios
}

/// Pick the best scenario for the objective, honouring the monthly budget
/// where possible.
///
/// When no scenario fits the budget the three lowest-payment scenarios form
/// the candidate pool and `budget_exceeded` is set; the optimizer still
/// returns a plan. Only an empty scenario set is an error.
pub fn find_best_plan(input: &OptimizationInput) -> LoanPlannerResult<OptimizationResult> {
    validate_input(input)?;

    let compared = evaluate_scenarios(input);
    if compared.is_empty() {
        return Err(LoanPlannerError::NoScenarios(if input.candidate_terms.is_empty() {
            "no candidate terms were supplied".into()
        } else if usable_terms(&input.candidate_terms).is_empty() {
            "every candidate term is 0 months".into()
        } else {
            "neither strategy produced a scenario".into()
        }));
    }

    let budget = input.budget_monthly.filter(|b| *b > Decimal::ZERO);
    let mut budget_exceeded = false;

    let pool: Vec<&Scenario> = match budget {
        Some(limit) => {
            let within: Vec<&Scenario> = compared
                .iter()
                .filter(|s| s.total_monthly_payment <= limit)
                .collect();
            if within.is_empty() {
                budget_exceeded = true;
                tracing::warn!(budget = %limit, "no scenario fits the monthly budget");
                cheapest(&compared, BUDGET_FALLBACK_POOL)
            } else {
                within
            }
        }
        None => compared.iter().collect(),
    };

    let best = pool
        .into_iter()
        .min_by_key(|s| input.objective.headline(s))
        .cloned()
        .ok_or_else(|| LoanPlannerError::NoScenarios("candidate pool is empty".into()))?;

    if let Some(limit) = budget {
        if best.total_monthly_payment > limit {
            budget_exceeded = true;
        }
    }

    let reason = build_reason(input.objective, &best, budget, budget_exceeded);
    tracing::info!(
        kind = %best.kind,
        term = best.term,
        budget_exceeded,
        "plan selected"
    );

    Ok(OptimizationResult {
        best,
        compared,
        reason,
        budget_exceeded,
    })
}

/// Run the optimizer and wrap the result in the standard output envelope.
pub fn optimize_plan(
    input: &OptimizationInput,
) -> LoanPlannerResult<ComputationOutput<OptimizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = find_best_plan(input)?;

    if result.budget_exceeded {
        warnings.push("The selected plan exceeds the monthly budget.".into());
    }
    if input.candidate_terms.contains(&0) {
        warnings.push("Candidate terms of 0 months were skipped.".into());
    }
    let closed = input.existing_loans.iter().filter(|l| l.is_closed()).count();
    if closed > 0 {
        warnings.push(format!("{closed} existing loan(s) have no outstanding balance."));
    }
    let termless = input
        .existing_loans
        .iter()
        .filter(|l| !l.is_closed() && l.months == 0)
        .count();
    if termless > 0 {
        warnings.push(format!(
            "{termless} existing loan(s) have a balance but no remaining term; they add no payment or interest."
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "objective": input.objective,
        "budget_monthly": input.budget_monthly.map(|b| b.to_string()),
        "new_loan_apr": input.new_loan_apr.to_string(),
        "candidate_terms": input.candidate_terms,
        "scenarios_compared": result.compared.len(),
    });

    Ok(with_metadata(
        "Avalanche paydown vs full consolidation across candidate terms",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &OptimizationInput) -> LoanPlannerResult<()> {
    let mut seen = HashSet::new();
    for loan in &input.existing_loans {
        if !seen.insert(loan.id.as_str()) {
            return Err(LoanPlannerError::InvalidInput {
                field: "existing_loans".into(),
                reason: format!("Loan id '{}' appears more than once.", loan.id),
            });
        }
    }
    Ok(())
}

fn usable_terms(terms: &[Months]) -> Vec<Months> {
    terms.iter().copied().filter(|t| *t > 0).collect()
}

/// The `n` scenarios with the lowest monthly payment, ties in input order.
fn cheapest(scenarios: &[Scenario], n: usize) -> Vec<&Scenario> {
    let mut sorted: Vec<&Scenario> = scenarios.iter().collect();
    sorted.sort_by_key(|s| s.total_monthly_payment);
    sorted.truncate(n);
    sorted
}

fn build_reason(
    objective: Objective,
    best: &Scenario,
    budget: Option<Money>,
    budget_exceeded: bool,
) -> String {
    let headline = match objective {
        Objective::MinTotalInterest => format!(
            "Lowest total interest: {} ({}).",
            best.total_interest.round_dp(2),
            best.description
        ),
        Objective::MinMonthlyPayment => format!(
            "Lowest monthly payment: {} ({}).",
            best.total_monthly_payment.round_dp(2),
            best.description
        ),
    };

    match budget {
        Some(limit) if budget_exceeded => format!(
            "No plan fits the monthly budget of {}; showing the closest alternative. {headline}",
            limit.round_dp(2)
        ),
        _ => headline,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
