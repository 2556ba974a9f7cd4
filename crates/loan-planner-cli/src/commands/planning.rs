use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;

use loan_planner_core::allocation::avalanche::allocate_cash_avalanche;
use loan_planner_core::optimizer::plan::{
    evaluate_scenarios, optimize_plan, Objective, OptimizationInput,
};
use loan_planner_core::{with_metadata, Loan, Money};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ObjectiveArg {
    MinInterest,
    MinPayment,
}

impl From<ObjectiveArg> for Objective {
    fn from(obj: ObjectiveArg) -> Self {
        match obj {
            ObjectiveArg::MinInterest => Objective::MinTotalInterest,
            ObjectiveArg::MinPayment => Objective::MinMonthlyPayment,
        }
    }
}

/// Body of an allocation request
#[derive(Debug, Deserialize)]
pub struct AllocationRequest {
    pub loans: Vec<Loan>,
    pub cash: Money,
}

/// Arguments for avalanche cash allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON/YAML input file with `loans` and `cash`
    #[arg(long)]
    pub input: Option<String>,

    /// Override the cash amount from the input
    #[arg(long)]
    pub cash: Option<Decimal>,
}

/// Arguments for scenario evaluation and optimisation
#[derive(Args)]
pub struct PlanArgs {
    /// Path to JSON/YAML optimisation input
    #[arg(long)]
    pub input: Option<String>,

    /// Override the objective from the input
    #[arg(long, value_enum)]
    pub objective: Option<ObjectiveArg>,

    /// Override the monthly budget from the input
    #[arg(long)]
    pub budget: Option<Decimal>,

    /// Override the candidate terms (comma-separated months, e.g. "12,36,60")
    #[arg(long, value_delimiter = ',')]
    pub terms: Option<Vec<u32>>,
}

fn plan_input(args: PlanArgs) -> Result<OptimizationInput, Box<dyn std::error::Error>> {
    let mut plan: OptimizationInput = input::read_structured(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for plan inputs")?;

    if let Some(objective) = args.objective {
        plan.objective = objective.into();
    }
    if let Some(budget) = args.budget {
        plan.budget_monthly = Some(budget);
    }
    if let Some(terms) = args.terms {
        plan.candidate_terms = terms;
    }
    Ok(plan)
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut request: AllocationRequest = input::read_structured(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for allocation")?;
    if let Some(cash) = args.cash {
        request.cash = cash;
    }

    let result = allocate_cash_avalanche(&request.loans, request.cash);
    let assumptions = serde_json::json!({
        "policy": "highest APR first",
        "cash": request.cash.to_string(),
    });

    let output = with_metadata(
        "Avalanche cash allocation",
        &assumptions,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_scenarios(args: PlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let plan = plan_input(args)?;
    let scenarios = evaluate_scenarios(&plan);

    let mut warnings = Vec::new();
    if scenarios.is_empty() {
        warnings.push("No scenarios were produced; check the candidate terms.".to_string());
    }
    let assumptions = serde_json::json!({
        "new_loan_apr": plan.new_loan_apr.to_string(),
        "candidate_terms": plan.candidate_terms,
    });

    let output = with_metadata(
        "No-consolidation and full-consolidation scenarios per candidate term",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        scenarios,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_optimize(args: PlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan = plan_input(args)?;
    let result = optimize_plan(&plan)?;
    Ok(serde_json::to_value(result)?)
}
