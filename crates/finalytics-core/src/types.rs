use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Monetary amounts. Cash flows may carry either sign.
pub type Money = f64;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = f64;

/// Year fractions or counts
pub type Years = f64;

/// Installments per year assumed by the loan functions when the caller has no
/// other schedule in mind.
pub const DEFAULT_PAYMENTS_PER_YEAR: u32 = 12;

/// Compounding periods per year assumed by the discrete time-value functions.
pub const DEFAULT_COMPOUNDING_FREQUENCY: u32 = 1;

/// How often a payment or compounding event happens within a year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Annual,
    SemiAnnual,
    Quarterly,
    #[default]
    Monthly,
    Weekly,
    Daily,
    /// Any other positive number of periods per year
    Custom(u32),
}

impl Frequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::Weekly => 52,
            Frequency::Daily => 365,
            Frequency::Custom(n) => n,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Annual => write!(f, "Annual"),
            Frequency::SemiAnnual => write!(f, "Semi-Annual"),
            Frequency::Quarterly => write!(f, "Quarterly"),
            Frequency::Monthly => write!(f, "Monthly"),
            Frequency::Weekly => write!(f, "Weekly"),
            Frequency::Daily => write!(f, "Daily"),
            Frequency::Custom(n) => write!(f, "{n}x per year"),
        }
    }
}

/// A single cash flow at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedCashFlow {
    pub date: NaiveDate,
    pub amount: Money,
}

impl DatedCashFlow {
    pub fn new(date: NaiveDate, amount: Money) -> Self {
        Self { date, amount }
    }
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
            precision: "f64".to_string(),
        },
    }
}
