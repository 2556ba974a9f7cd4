use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Annual rates expressed as percentages (12 = 12% per year). Divide by
/// 100 and by 12 to get the monthly periodic rate.
pub type Percent = Decimal;

/// Count of monthly periods
pub type Months = u32;

/// One debt instrument.
///
/// Loans are value objects: prepayment, cash allocation and consolidation
/// all produce a new `Loan` instead of mutating an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Stable identifier, unique within a request.
    pub id: String,
    /// Display label only.
    #[serde(default)]
    pub name: String,
    /// Outstanding balance.
    pub principal: Money,
    /// Nominal annual rate in percent. May be zero.
    pub apr: Percent,
    /// Remaining term in months.
    pub months: Months,
}

impl Loan {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        principal: Money,
        apr: Percent,
        months: Months,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            principal,
            apr,
            months,
        }
    }

    /// Copy of this loan with a different outstanding balance.
    pub fn with_principal(&self, principal: Money) -> Self {
        Self {
            principal,
            ..self.clone()
        }
    }

    /// A loan with nothing outstanding is inert.
    pub fn is_closed(&self) -> bool {
        self.principal <= Decimal::ZERO
    }
}

/// Aggregate figures for a single loan under its regular payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
