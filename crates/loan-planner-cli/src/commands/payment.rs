use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use loan_planner_core::annuity::{monthly_rate, remaining_balance, summarize_loan};
use loan_planner_core::{with_metadata, Loan};

/// Arguments for a level-payment quote
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PaymentArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual percentage rate, in percent (12 = 12%)
    #[arg(long)]
    pub apr: Decimal,

    /// Term in months
    #[arg(long)]
    pub months: u32,

    /// Also report the balance left after this many payments
    #[arg(long)]
    pub after: Option<u32>,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let loan = Loan::new("quote", "Quote", args.principal, args.apr, args.months);
    let summary = summarize_loan(&loan);

    let mut warnings = Vec::new();
    if summary.monthly_payment.is_zero() {
        warnings.push("Principal is not positive or the term is zero; payment is 0.".to_string());
    }

    let result = serde_json::json!({
        "monthly_payment": summary.monthly_payment.round_dp(2),
        "total_paid": summary.total_paid.round_dp(2),
        "total_interest": summary.total_interest.round_dp(2),
        "remaining_balance": args.after.map(|k| remaining_balance(&loan, k).round_dp(2)),
    });
    let assumptions = serde_json::json!({
        "monthly_rate": monthly_rate(args.apr).to_string(),
    });

    let output = with_metadata(
        "Closed-form annuity payment",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
