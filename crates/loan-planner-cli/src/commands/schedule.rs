use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use loan_planner_core::amortization::prepayment::analyze_prepayment;
use loan_planner_core::amortization::schedule::{
    schedule_report, Prepayment, PrepaymentMode, ScheduleParams,
};
use loan_planner_core::with_metadata;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PrepayModeArg {
    Reduce,
    Shorten,
}

impl From<PrepayModeArg> for PrepaymentMode {
    fn from(mode: PrepayModeArg) -> Self {
        match mode {
            PrepayModeArg::Reduce => PrepaymentMode::Reduce,
            PrepayModeArg::Shorten => PrepaymentMode::Shorten,
        }
    }
}

/// Arguments shared by the schedule and prepayment commands
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScheduleArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual percentage rate, in percent
    #[arg(long)]
    pub apr: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub months: Option<u32>,

    /// One-time extra principal payment
    #[arg(long)]
    pub prepay_amount: Option<Decimal>,

    /// Period (1-based) in which the prepayment is made
    #[arg(long)]
    pub prepay_at: Option<u32>,

    /// What the prepayment changes
    #[arg(long, value_enum, default_value = "reduce")]
    pub prepay_mode: PrepayModeArg,

    /// Date of the first regular payment (YYYY-MM-DD)
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,
}

fn schedule_params(args: ScheduleArgs) -> Result<ScheduleParams, Box<dyn std::error::Error>> {
    if let Some(params) = input::read_structured::<ScheduleParams>(args.input.as_deref())? {
        return Ok(params);
    }

    let mut params = ScheduleParams::new(
        args.principal
            .ok_or("--principal is required (or provide --input)")?,
        args.apr.ok_or("--apr is required (or provide --input)")?,
        args.months
            .ok_or("--months is required (or provide --input)")?,
    );
    params.first_payment_date = args.first_payment_date;

    if let Some(amount) = args.prepay_amount {
        params.prepayment = Some(Prepayment {
            amount,
            at_period: args
                .prepay_at
                .ok_or("--prepay-at is required with --prepay-amount")?,
            mode: args.prepay_mode.into(),
        });
    }
    Ok(params)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params = schedule_params(args)?;
    let result = schedule_report(&params)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_prepayment(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let params = schedule_params(args)?;
    let impact = analyze_prepayment(&params)?;

    let assumptions = serde_json::json!({
        "principal": params.principal.to_string(),
        "apr": params.apr.to_string(),
        "periods": params.periods,
    });
    let mut warnings = Vec::new();
    if impact.amount_applied == Decimal::ZERO {
        warnings.push("The prepayment falls outside the schedule and was not applied.".to_string());
    }

    let output = with_metadata(
        "Schedule with prepayment against the untouched schedule",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        impact,
    );
    Ok(serde_json::to_value(output)?)
}
