pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "depreciation")]
pub mod depreciation;

#[cfg(feature = "loans")]
pub mod loans;

pub use error::FinalyticsError;
pub use types::*;

/// Standard result type for all finalytics operations
pub type FinalyticsResult<T> = Result<T, FinalyticsError>;
