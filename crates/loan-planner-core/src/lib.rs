pub mod annuity;
pub mod error;
pub mod types;

#[cfg(feature = "schedule")]
pub mod amortization;

#[cfg(feature = "allocation")]
pub mod allocation;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "optimizer")]
pub mod optimizer;

pub use error::LoanPlannerError;
pub use types::*;

/// Standard result type for all loan-planner operations
pub type LoanPlannerResult<T> = Result<T, LoanPlannerError>;
