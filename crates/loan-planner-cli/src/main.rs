mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::payment::PaymentArgs;
use commands::planning::{AllocateArgs, PlanArgs};
use commands::schedule::ScheduleArgs;

/// Consumer-loan amortization and restructuring planner
#[derive(Parser)]
#[command(
    name = "lpa",
    version,
    about = "Consumer-loan amortization and restructuring planner",
    long_about = "A CLI for consumer-loan planning with decimal precision. Quotes level \
                  payments, builds amortization schedules with prepayments, allocates \
                  cash avalanche-style and compares consolidation strategies."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug detail to stderr (LPA_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote the level monthly payment for a loan
    Payment(PaymentArgs),
    /// Build a month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Measure what a one-time prepayment saves
    Prepayment(ScheduleArgs),
    /// Spread cash over existing loans, highest rate first
    Allocate(AllocateArgs),
    /// Evaluate every restructuring scenario without choosing one
    Scenarios(PlanArgs),
    /// Choose the best restructuring plan for an objective and budget
    Optimize(PlanArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::payment::run_payment(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Prepayment(args) => commands::schedule::run_prepayment(args),
        Commands::Allocate(args) => commands::planning::run_allocate(args),
        Commands::Scenarios(args) => commands::planning::run_scenarios(args),
        Commands::Optimize(args) => commands::planning::run_optimize(args),
        Commands::Version => {
            println!("lpa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
